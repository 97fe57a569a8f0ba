use crate::{
    models::request_params::{MAX_LIMIT, OhlcRequest},
    providers::{ProviderError, ValidationSnafu},
};

/// Valid `step` values (seconds) accepted by the OHLC endpoint.
pub const SUPPORTED_STEPS: [i64; 12] = [
    60, 180, 300, 900, 1_800, 3_600, 7_200, 14_400, 21_600, 43_200, 86_400, 259_200,
];

/// Rejects requests Bitstamp would refuse or silently reshape.
pub fn validate_request(request: &OhlcRequest) -> Result<(), ProviderError> {
    request
        .validate()
        .map_err(|message| ValidationSnafu { message }.build())?;

    let step = request.step.secs();
    if !SUPPORTED_STEPS.contains(&step) {
        return ValidationSnafu {
            message: format!("step {step}s is not supported by Bitstamp"),
        }
        .fail();
    }
    if !request.pair.chars().all(|c| c.is_ascii_alphanumeric()) {
        return ValidationSnafu {
            message: format!("pair {:?} must be alphanumeric", request.pair),
        }
        .fail();
    }
    debug_assert!(request.limit <= MAX_LIMIT);
    Ok(())
}

/// Query string for one call. `end` is the last bar wanted, inclusive.
pub fn construct_params(request: &OhlcRequest) -> Vec<(&'static str, String)> {
    vec![
        ("step", request.step.secs().to_string()),
        ("start", request.start.to_string()),
        ("end", request.end.to_string()),
        ("limit", request.limit.to_string()),
    ]
}
