//! Deterministic prompt templates for the generation stages.
//!
//! Each stage builds its prompt from a fixed template plus the State Record's
//! `topic` and `language`. Output constraints (minimum length, language,
//! formatting) are embedded in the prompt text rather than validated after
//! the fact.

/// Sentinel that should never appear in real templates.
const ESCAPE_SENTINEL: &str = "\x00LBRACE\x00";
/// Sentinel for escaped closing brace.
const ESCAPE_SENTINEL_CLOSE: &str = "\x00RBRACE\x00";

/// Template for the title stage. Placeholders: `{topic}`.
pub const TITLE_TEMPLATE: &str = "\
You are an expert blog content writer. Generate ONLY a creative and \
SEO-friendly title for a blog post about: {topic}

Requirements:
- Return only the title text, no additional formatting
- Make it engaging and clickable
- Keep it under 60 characters for SEO";

/// Template for the content stage. Placeholders: `{topic}`, `{language}`.
pub const CONTENT_TEMPLATE: &str = "\
You are an expert blog writer specializing in engaging, emoji-enhanced \
content. Create a compelling blog post about: {topic}

Requirements:
- Write in {language} language
- Use proper Markdown formatting with headers (##, ###), bullet points, and emphasis
- Add relevant emojis to section headers and key points
- Include a compelling introduction that hooks the reader
- Structure the content with clear sections and subheadings
- Include practical examples or tips where relevant
- End with a thought-provoking conclusion
- Minimum 1200 words
- Do NOT include the title, only the content";

/// Template for the translation stage. Placeholders: `{language}`, `{content}`.
pub const TRANSLATION_TEMPLATE: &str = "\
Translate the following blog content into {language}.

Requirements:
- Maintain the original tone, style, and formatting
- Adapt cultural references and idioms appropriately
- Preserve all Markdown formatting
- Keep the same structure and flow

ORIGINAL CONTENT:
{content}

TRANSLATED CONTENT:";

/// Build a prompt string with variable substitution.
///
/// Replaces each `{key}` placeholder with the matching value from `vars`.
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use blogforge::prompt::render;
///
/// let prompt = render("Write about {topic} in {language}", &[
///     ("topic", "Rust"),
///     ("language", "English"),
/// ]);
/// assert_eq!(prompt, "Write about Rust in English");
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    // Pass 1: protect escaped braces
    let mut rendered = template.replace("{{", ESCAPE_SENTINEL);
    rendered = rendered.replace("}}", ESCAPE_SENTINEL_CLOSE);

    // Pass 2: substitute placeholders
    for (key, value) in vars {
        let placeholder = format!("{{{}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }

    // Pass 3: restore escaped braces
    rendered = rendered.replace(ESCAPE_SENTINEL, "{");
    rendered = rendered.replace(ESCAPE_SENTINEL_CLOSE, "}");
    rendered
}

/// Render the title-stage prompt for a topic.
pub fn title_prompt(topic: &str) -> String {
    render(TITLE_TEMPLATE, &[("topic", topic)])
}

/// Render the content-stage prompt for a topic and target language.
pub fn content_prompt(topic: &str, language: &str) -> String {
    render(CONTENT_TEMPLATE, &[("topic", topic), ("language", language)])
}

/// Render the translation-stage prompt for existing content.
pub fn translation_prompt(content: &str, language: &str) -> String {
    render(
        TRANSLATION_TEMPLATE,
        &[("language", language), ("content", content)],
    )
}
