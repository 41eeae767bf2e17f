//! Checkbox toggle detection over two snapshots of the tracking comment.
//!
//! A checkbox line looks like:
//!
//! ```text
//! - [ ] `build-preview` on CI at this [workflow](https://…).
//! ```
//!
//! Detection is a pure function of the label and the two comment bodies.

use regex::Regex;

const UNCHECKED_MARKER: &str = r"\[\s*\]";
const CHECKED_MARKER: &str = r"\[\s*[xX]\s*\]";
const TRAILING_PHRASE: &str = r"\s*on\s*CI\s*at\s*this\s*\[workflow\]";

/// Escape `label` so every regex metacharacter in it matches literally.
///
/// Returns `None` for an empty or blank label: a blank label never names a
/// checkbox, so callers treat it as "no match".
pub fn escape_label(label: &str) -> Option<String> {
    if label.trim().is_empty() {
        return None;
    }
    Some(regex::escape(label))
}

/// Build the pattern matching the checkbox line for `label` in the given state.
pub fn checkbox_pattern(label: &str, checked: bool) -> Option<Regex> {
    let escaped = escape_label(label)?;
    let marker = if checked {
        CHECKED_MARKER
    } else {
        UNCHECKED_MARKER
    };
    let pattern = format!(r"{marker}\s*`{escaped}`{TRAILING_PHRASE}");
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(label, error = %e, "checkbox pattern failed to compile");
            None
        }
    }
}

/// True iff the checkbox for `label` is unchecked in `previous_body` and
/// checked in `current_body`.
pub fn was_toggled_on(label: &str, previous_body: &str, current_body: &str) -> bool {
    let (Some(unchecked), Some(checked)) =
        (checkbox_pattern(label, false), checkbox_pattern(label, true))
    else {
        return false;
    };

    let toggled = unchecked.is_match(previous_body) && checked.is_match(current_body);
    if toggled {
        tracing::info!(workflow = label, "detected toggle on");
    }
    toggled
}
