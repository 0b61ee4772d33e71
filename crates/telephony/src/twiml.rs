//! Voice markup rendering
//!
//! Builds the XML document a webhook returns: speak-this-text,
//! gather-next-input, dial-these-numbers, or redirect. Prompts are spoken
//! in sentence-sized chunks with short pauses so the synthesized voice
//! stays intelligible over a phone line.

use call_router_core::DIAL_TIMEOUT_SECS;

/// Synthesized voice used for all spoken prompts.
pub const VOICE_NAME: &str = "Polly.Aditi";

/// Speech language for prompts and recognition.
pub const LANGUAGE_CODE: &str = "en-IN";

/// Gather (speech input) parameters.
#[derive(Debug, Clone)]
pub struct GatherSpec {
    /// Webhook the provider posts the result to.
    pub action: String,
    /// Seconds of silence before the gather gives up.
    pub timeout: u32,
    /// Hint vocabulary for the recognizer.
    pub hints: Option<String>,
    /// Prompt spoken inside the gather.
    pub prompt: String,
}

impl GatherSpec {
    pub fn new(action: impl Into<String>, timeout: u32, prompt: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            timeout,
            hints: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = Some(hints.into());
        self
    }
}

/// Dial parameters: try these numbers in order with a per-leg timeout.
#[derive(Debug, Clone)]
pub struct DialSpec {
    pub numbers: Vec<String>,
    pub timeout: u32,
    pub caller_id: Option<String>,
    /// Completion callback webhook.
    pub action: String,
}

impl DialSpec {
    pub fn new(numbers: Vec<String>, caller_id: Option<String>, action: impl Into<String>) -> Self {
        Self {
            numbers,
            timeout: DIAL_TIMEOUT_SECS,
            caller_id,
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum Verb {
    Say(String),
    Pause(u32),
    Gather(GatherSpec),
    Dial(DialSpec),
    Redirect(String),
}

/// One outbound voice markup document.
#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speak text in sentence chunks with one-second pauses between them.
    pub fn say(&mut self, text: &str) -> &mut Self {
        for chunk in speech_chunks(text) {
            self.verbs.push(Verb::Say(chunk));
            self.verbs.push(Verb::Pause(1));
        }
        self
    }

    pub fn gather(&mut self, spec: GatherSpec) -> &mut Self {
        self.verbs.push(Verb::Gather(spec));
        self
    }

    pub fn dial(&mut self, spec: DialSpec) -> &mut Self {
        self.verbs.push(Verb::Dial(spec));
        self
    }

    pub fn redirect(&mut self, url: &str) -> &mut Self {
        self.verbs.push(Verb::Redirect(url.to_string()));
        self
    }

    /// Render the full XML document.
    pub fn render(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            render_verb(&mut out, verb);
        }
        out.push_str("</Response>");
        out
    }
}

fn render_verb(out: &mut String, verb: &Verb) {
    match verb {
        Verb::Say(text) => {
            out.push_str(&format!(
                "<Say voice=\"{VOICE_NAME}\" language=\"{LANGUAGE_CODE}\">{}</Say>",
                escape_xml(text)
            ));
        }
        Verb::Pause(length) => {
            out.push_str(&format!("<Pause length=\"{length}\"/>"));
        }
        Verb::Gather(spec) => {
            out.push_str(&format!(
                "<Gather input=\"speech\" action=\"{}\" method=\"POST\" \
                 speechTimeout=\"auto\" bargeIn=\"true\" speechModel=\"phone_call\" \
                 language=\"{LANGUAGE_CODE}\" timeout=\"{}\"",
                escape_xml(&spec.action),
                spec.timeout
            ));
            if let Some(hints) = &spec.hints {
                out.push_str(&format!(" hints=\"{}\"", escape_xml(hints)));
            }
            out.push('>');
            for chunk in speech_chunks(&spec.prompt) {
                out.push_str(&format!(
                    "<Say voice=\"{VOICE_NAME}\" language=\"{LANGUAGE_CODE}\">{}</Say>",
                    escape_xml(&chunk)
                ));
                out.push_str("<Pause length=\"1\"/>");
            }
            out.push_str("</Gather>");
        }
        Verb::Dial(spec) => {
            out.push_str(&format!(
                "<Dial timeout=\"{}\" action=\"{}\" method=\"POST\"",
                spec.timeout,
                escape_xml(&spec.action)
            ));
            if let Some(caller_id) = &spec.caller_id {
                out.push_str(&format!(" callerId=\"{}\"", escape_xml(caller_id)));
            }
            out.push('>');
            for number in &spec.numbers {
                out.push_str(&format!("<Number>{}</Number>", escape_xml(number)));
            }
            out.push_str("</Dial>");
        }
        Verb::Redirect(url) => {
            out.push_str(&format!(
                "<Redirect method=\"POST\">{}</Redirect>",
                escape_xml(url)
            ));
        }
    }
}

/// Split prompt text into sentence-like chunks, then on commas for breath
/// points within long sentences.
fn speech_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut sentence = String::new();
    for c in text.chars() {
        sentence.push(c);
        if matches!(c, '.' | '!' | '?') {
            push_sentence(&mut chunks, &sentence);
            sentence.clear();
        }
    }
    push_sentence(&mut chunks, &sentence);
    chunks
}

fn push_sentence(chunks: &mut Vec<String>, sentence: &str) {
    for piece in sentence.split(',') {
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
