//! The fixed LLM-cleanup prompt appended after the transcription portions.
//!
//! The prompt asks a downstream assistant to fix spelling, merge the
//! overlapping portions, and reformat the text into speaker turns. There is
//! exactly one canonical wording; the `{speakers}` marker is replaced with a
//! sentence naming the speakers when the caller supplied names, or removed
//! entirely otherwise.

/// Canonical cleanup prompt. `{speakers}` is the only substitution point.
pub const CLEANUP_PROMPT_TEMPLATE: &str = "---
You are a helpful assistant. Your task is to correct any spelling discrepancies in
the transcribed text above, combine portions, and split with new lines when speaker or topic appear to change.
Remove filler words such as okay, right, you know, kind of, like, really, you know, well, and others.
Do not remove phrases otherwise, keep the whole meaning.
Only add necessary punctuation such as periods, commas, and capitalization, and use only the context provided.
{speakers}
The format must be as follows:
**Speaker 1 Name**: Hello.

**Speaker 2 Name**: Hello.

**Speaker 1 Name**: How are you?
";

/// The sentence substituted for `{speakers}`, or an empty string when no
/// names were supplied.
pub fn speaker_sentence(speaker_names: Option<&str>) -> String {
    match speaker_names {
        Some(names) => format!("The speakers are {names}."),
        None => String::new(),
    }
}

/// Render the cleanup prompt with the speaker sentence substituted in.
pub fn cleanup_prompt(speaker_names: Option<&str>) -> String {
    CLEANUP_PROMPT_TEMPLATE.replace("{speakers}", &speaker_sentence(speaker_names))
}
