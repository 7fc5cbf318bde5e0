use std::io;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{info, warn};

use crate::desk::{BookingDesk, SlotRequest};
use crate::engine::ScheduleError;
use crate::limits::MAX_REQUEST_LINE_LEN;
use crate::model::*;
use crate::observability::{self, REQUESTS_TOTAL};

/// One JSON line from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Slots { request: SlotRequest },
    Validate { request: SlotRequest, start: ClockTime },
    SetSalonDay { day: DayAvailability },
    SetStylistDay { stylist: StylistId, day: DayAvailability },
    ClearStylistDay { stylist: StylistId, day_of_week: DayOfWeek },
    UpsertStylist { id: StylistId, name: String },
    RemoveStylist { id: StylistId },
    UpsertService { id: ServiceId, name: String, duration: ServiceDuration },
    RemoveService { id: ServiceId },
    ListStylists,
    ListServices,
    Version,
}

/// One JSON line back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Slots { slots: Vec<ClockTime> },
    Valid { start: ClockTime, valid: bool },
    Stylists { stylists: Vec<StylistInfo> },
    Services { services: Vec<ServiceInfo> },
    /// A mutation was applied; `version` is the new schedule version.
    Ok { version: u64 },
    Version { version: u64 },
    Error { message: String },
}

impl From<ScheduleError> for Response {
    fn from(e: ScheduleError) -> Self {
        Response::Error {
            message: e.to_string(),
        }
    }
}

/// Execute one decoded request against the desk.
pub async fn execute(desk: &BookingDesk, req: Request) -> Response {
    metrics::counter!(REQUESTS_TOTAL, "op" => observability::request_label(&req)).increment(1);
    let store = desk.store();
    let result = match req {
        Request::Slots { request } => desk
            .available_slots(&request)
            .await
            .map(|slots| Response::Slots { slots }),
        Request::Validate { request, start } => desk
            .validate_start(&request, start)
            .await
            .map(|valid| Response::Valid { start, valid }),
        Request::SetSalonDay { day } => store
            .set_salon_day(day)
            .await
            .map(|version| Response::Ok { version }),
        Request::SetStylistDay { stylist, day } => store
            .set_stylist_day(stylist, day)
            .await
            .map(|version| Response::Ok { version }),
        Request::ClearStylistDay {
            stylist,
            day_of_week,
        } => store
            .clear_stylist_day(stylist, day_of_week)
            .await
            .map(|version| Response::Ok { version }),
        Request::UpsertStylist { id, name } => store
            .upsert_stylist(id, name)
            .await
            .map(|version| Response::Ok { version }),
        Request::RemoveStylist { id } => store
            .remove_stylist(id)
            .await
            .map(|version| Response::Ok { version }),
        Request::UpsertService { id, name, duration } => store
            .upsert_service(id, name, duration)
            .await
            .map(|version| Response::Ok { version }),
        Request::RemoveService { id } => store
            .remove_service(id)
            .await
            .map(|version| Response::Ok { version }),
        Request::ListStylists => Ok(Response::Stylists {
            stylists: store.list_stylists().await,
        }),
        Request::ListServices => Ok(Response::Services {
            services: store.list_services().await,
        }),
        Request::Version => Ok(Response::Version {
            version: store.version(),
        }),
    };
    result.unwrap_or_else(Response::from)
}

/// Decode and execute one raw line. Blank lines produce no response.
pub async fn handle_line(desk: &BookingDesk, line: &str) -> Option<Response> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Request>(line) {
        Ok(req) => Some(execute(desk, req).await),
        Err(e) => {
            warn!("malformed request: {e}");
            metrics::counter!(crate::observability::SCHEDULE_ERRORS_TOTAL, "kind" => "malformed")
                .increment(1);
            Some(ScheduleError::Malformed(e.to_string()).into())
        }
    }
}

fn codec_error(e: LinesCodecError) -> io::Error {
    match e {
        LinesCodecError::Io(e) => e,
        other => io::Error::other(other.to_string()),
    }
}

/// Serve JSON-lines requests from `reader` until EOF, answering on `writer`.
///
/// A bad request yields an error line and the session carries on. An
/// oversized line is answered with an error, after which the codec stops.
pub async fn process_session<R, W>(reader: R, writer: W, desk: Arc<BookingDesk>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_REQUEST_LINE_LEN));
    let mut out = FramedWrite::new(writer, LinesCodec::new());
    let mut handled = 0u64;
    info!("session started");

    while let Some(frame) = lines.next().await {
        let response = match frame {
            Ok(line) => match handle_line(&desk, &line).await {
                Some(response) => response,
                None => continue,
            },
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!("request line exceeds {MAX_REQUEST_LINE_LEN} bytes");
                ScheduleError::LimitExceeded("request line too long").into()
            }
            Err(LinesCodecError::Io(e)) => return Err(e),
        };
        let encoded = serde_json::to_string(&response).map_err(io::Error::other)?;
        out.send(encoded).await.map_err(codec_error)?;
        handled += 1;
    }

    info!("session ended after {handled} request(s)");
    Ok(())
}
