/*!
 * Tracker Module
 * Launch sequencing for applet-hosted processes
 */

pub mod applet_tracker;
pub mod debug;
pub mod event;
pub mod service;

pub use applet_tracker::{AppletTracker, AppletTrackerBuilder};
pub use debug::{ProcessSummary, TrackerSnapshot};
pub use event::ProcessQueuedEvent;
pub use service::{RemoteShim, TrackerCommand, TrackerHandle, TrackerService};
