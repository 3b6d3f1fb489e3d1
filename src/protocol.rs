//! Record parsing for the `rate;break` wire format.
//!
//! One record per line: field 0 is a non-negative integer heart rate
//! (`0` means "no valid reading"), field 1 is the break-button state as
//! `0`/`1`. Devices emit records far faster than the host polls, so a
//! batch of lines usually piles up between drains — only the newest known
//! good value per field matters, and the two fields are scanned
//! independently (they may come from different lines of the same batch).

use log::{debug, warn};

/// The newest-known-good fields extracted from one poll batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// Newest valid non-zero heart rate in the batch; `0` if none.
    pub rate: u32,
    /// Newest valid break-button state in the batch; `None` if absent.
    pub breaking: Option<bool>,
}

impl RawSample {
    /// True when the batch produced nothing to act on.
    pub fn is_empty(&self) -> bool {
        self.rate == 0 && self.breaking.is_none()
    }
}

/// Parse a single record into its fields, tolerating malformed input.
///
/// A wrong field count skips the whole line; a field that fails numeric
/// parsing is dropped for that field only. A heart rate of `0` is treated
/// as absent.
pub fn parse_line(line: &str) -> (Option<u32>, Option<bool>) {
    // Devices using println-style output terminate with \r\n.
    let line = line.trim_end_matches('\r');
    let mut fields = line.splitn(3, ';');
    let (Some(rate_field), Some(break_field), None) =
        (fields.next(), fields.next(), fields.next())
    else {
        warn!("skipping malformed record: {line:?}");
        return (None, None);
    };

    let rate = match rate_field.trim().parse::<u32>() {
        Ok(0) => None,
        Ok(r) => Some(r),
        Err(_) => {
            debug!("unparseable rate field in {line:?}");
            None
        }
    };
    let breaking = match break_field.trim().parse::<u8>() {
        Ok(b) => Some(b == 1),
        Err(_) => {
            debug!("unparseable break field in {line:?}");
            None
        }
    };
    (rate, breaking)
}

/// Scan a batch of lines (oldest first) and keep, per field independently,
/// the most recent valid value.
pub fn scan_batch<'a, I>(lines: I) -> RawSample
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut sample = RawSample::default();
    for line in lines.into_iter().rev() {
        let (rate, breaking) = parse_line(line);
        if sample.rate == 0 {
            if let Some(r) = rate {
                sample.rate = r;
            }
        }
        if sample.breaking.is_none() {
            sample.breaking = breaking;
        }
        if sample.rate > 0 && sample.breaking.is_some() {
            break; // both fields resolved, older lines are redundant
        }
    }
    sample
}
