//! Fixed strings shared between the prompts and the code that interprets their output.

/// The marker the model is told to emit, verbatim, when a message is not an event.
pub const IRRELEVANT_SENTINEL: &str = "EVENT_DATA_NOT_FOUND";

/// `Weekday, Month Day, Year, HH:MM TZ`, e.g. `Saturday, June 1, 2024, 18:00 UTC`.
pub const HUMAN_READABLE_TIME_FORMAT: &str = "%A, %B %-d, %Y, %H:%M %Z";

/// [`HUMAN_READABLE_TIME_FORMAT`] without the zone, for times labelled separately.
pub const HUMAN_READABLE_LOCAL_FORMAT: &str = "%A, %B %-d, %Y, %H:%M";

/// Template name of the system prompt used to extract a new event.
pub const PROMPT_CREATE_EVENT: &str = "prompt-create-event.txt";

/// Template name of the proposal posted back to the channel.
pub const PROPOSED_EVENT: &str = "proposed-event.md";

/// Embedded default for [`PROMPT_CREATE_EVENT`].
pub const DEFAULT_PROMPT_CREATE_EVENT: &str = include_str!("../../templates/prompt-create-event.txt");

/// Embedded default for [`PROPOSED_EVENT`].
pub const DEFAULT_PROPOSED_EVENT: &str = include_str!("../../templates/proposed-event.md");
