//! Every fixed pause in the join flow, named and tuned in one place.

use std::time::Duration;

/// Interval between bounded-polling condition checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Media-permission surfaces render asynchronously after the meeting page
/// loads; device controls do not exist until they have settled.
pub const PERMISSION_SURFACE_SETTLE: Duration = Duration::from_secs(5);

/// The secret prompt renders its input field before the field accepts input.
pub const SECRET_PROMPT_SETTLE: Duration = Duration::from_secs(2);

/// The sign-in form enables its advance control asynchronously after the
/// secret is filled in.
pub const PRE_SUBMIT_SETTLE: Duration = Duration::from_secs(1);

/// Device toggles report their new state asynchronously after a click.
pub const CONTROL_TOGGLE_SETTLE: Duration = Duration::from_secs(2);

/// The join control renders before its click handler is attached.
pub const PRE_JOIN_SETTLE: Duration = Duration::from_secs(2);

/// Lobby-to-meeting transition after activating the join control.
pub const POST_JOIN_SETTLE: Duration = Duration::from_secs(5);
