//! Engine outcomes to wire responses

use toasty_api::{BedView, ErrorCode, ErrorInfo, Response, ResponsePayload, SessionView};
use toasty_core::{AdmissionDecision, CancelDecision, Denial};
use toasty_store::StoreError;
use toasty_util::ToastyError;

pub fn admission(request_id: u64, decision: AdmissionDecision) -> Response {
    match decision {
        AdmissionDecision::Admitted(customer) => Response::success(
            request_id,
            ResponsePayload::Admitted {
                id: customer.id,
                name: customer.name,
                level: customer.level,
            },
        ),
        AdmissionDecision::Denied(denial) => {
            let response = Response::error(
                request_id,
                ErrorInfo::new(denial.error_code(), denial.message()),
            );
            match denial {
                Denial::SessionInProgress { customer_id } => {
                    response.with_payload(ResponsePayload::SessionInProgress { customer_id })
                }
                _ => response,
            }
        }
    }
}

pub fn cancellation(request_id: u64, decision: CancelDecision) -> Response {
    match decision {
        CancelDecision::Cancelled(_) | CancelDecision::NothingToCancel => {
            Response::empty(request_id)
        }
        CancelDecision::Denied(denial) => Response::error(
            request_id,
            ErrorInfo::new(denial.error_code(), denial.message()),
        ),
    }
}

/// Every start rejection is an input error
pub fn start_bed(request_id: u64, result: toasty_util::Result<()>) -> Response {
    match result {
        Ok(()) => Response::empty(request_id),
        Err(e) => Response::error(
            request_id,
            ErrorInfo::new(ErrorCode::Indeterminate, e.to_string()),
        ),
    }
}

pub fn bed_status(request_id: u64, result: toasty_util::Result<Vec<BedView>>) -> Response {
    match result {
        Ok(beds) => Response::success(request_id, ResponsePayload::Beds { beds }),
        Err(ToastyError::CustomerNotFound(_)) => Response::error(
            request_id,
            ErrorInfo::new(ErrorCode::NotFound, "Customer not found"),
        ),
        Err(e) => Response::error(
            request_id,
            ErrorInfo::new(ErrorCode::Indeterminate, e.to_string()),
        ),
    }
}

pub fn recent_sessions(request_id: u64, result: Result<Vec<SessionView>, StoreError>) -> Response {
    match result {
        Ok(sessions) => Response::success(request_id, ResponsePayload::Sessions { sessions }),
        Err(e) => Response::error(
            request_id,
            ErrorInfo::new(ErrorCode::Indeterminate, e.to_string()),
        ),
    }
}
