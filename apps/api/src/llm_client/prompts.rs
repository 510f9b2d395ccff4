// Cross-cutting prompt fragments.
// Each AI function defines its own prompts alongside it and reuses these.

/// Appended to system prompts whose reply is parsed as JSON.
pub const JSON_OBJECT_INSTRUCTION: &str = "\
    Respond with a single JSON object only. \
    Do NOT include any text outside the JSON object.";
