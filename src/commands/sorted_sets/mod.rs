mod zadd;
mod zcard;
mod zrange;
mod zrank;
mod zrem;
mod zscore;

pub use zadd::{zadd, ZaddArguments};
pub use zcard::{zcard, ZcardArguments};
pub use zrange::{zrange, ZrangeArguments};
pub use zrank::{zrank, ZrankArguments};
pub use zrem::{zrem, ZremArguments};
pub use zscore::{zscore, ZscoreArguments};

use crate::commands::CommandError;

/// Parses a score the way Redis does: any float, including `inf`, `+inf`
/// and `-inf`, but not NaN.
pub fn parse_score(input: &str) -> Result<f64, CommandError> {
    match input.parse::<f64>() {
        Ok(score) if !score.is_nan() => Ok(score),
        _ => Err(CommandError::NotAFloat),
    }
}

pub fn format_score(score: f64) -> String {
    score.to_string()
}
