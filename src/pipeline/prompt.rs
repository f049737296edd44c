//! Prompt templates and answer parsing

use regex::Regex;
use std::sync::OnceLock;

use crate::embedding::MemoryQueryResult;

pub const STUFF_SYSTEM_PROMPT: &str = "Given the following extracted parts of long documents and a question, \
create a final answer with references (\"SOURCES\"). If you don't know the answer, just say that you don't know. \
Don't try to make up an answer. ALWAYS return a \"SOURCES\" part in your answer, listing source names separated by commas.";

pub const RELATED_PAGE_TEMPLATE: &str = "Provide a detailed answer to the <question> using the information from the <related_page>.

<question>
{{$question}}
</question>

<related_page>
{{$related_page}}
</related_page>

Answer:
";

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*\$([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid template pattern")
    })
}

fn sources_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bSOURCES?:\s*").expect("valid sources pattern"))
}

/// Substitute `{{$name}}` variables; unknown variables render empty
pub fn render_template(template: &str, variables: &[(&str, &str)]) -> String {
    variable_pattern()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            variables
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| {
                    tracing::debug!(variable = name, "Template variable has no value");
                    String::new()
                })
        })
        .into_owned()
}

/// User turn listing every retrieved chunk with its source, then the question
pub fn stuff_prompt(question: &str, chunks: &[MemoryQueryResult]) -> String {
    let mut prompt = String::new();
    prompt.push_str("QUESTION: ");
    prompt.push_str(question);
    prompt.push_str("\n=========\n");
    for chunk in chunks {
        prompt.push_str(&format!(
            "Content: {}\nSource: {}\n\n",
            chunk.text.trim(),
            chunk.description
        ));
    }
    prompt.push_str("=========\nFINAL ANSWER:");
    prompt
}

/// Split a model reply into answer text and its trailing `SOURCES:` list
pub fn split_sources(reply: &str) -> (String, Vec<String>) {
    let Some(found) = sources_pattern().find_iter(reply).last() else {
        return (reply.trim().to_string(), Vec::new());
    };

    let answer = reply[..found.start()].trim().to_string();
    let sources = reply[found.end()..]
        .split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    (answer, sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_related_page_template() {
        let rendered = render_template(
            RELATED_PAGE_TEMPLATE,
            &[("question", "Why?"), ("related_page", "Because.")],
        );
        assert!(rendered.contains("<question>\nWhy?\n</question>"));
        assert!(rendered.contains("<related_page>\nBecause.\n</related_page>"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_unknown_variable_renders_empty() {
        assert_eq!(render_template("a{{ $missing }}b", &[]), "ab");
    }

    #[test]
    fn test_split_sources() {
        let (answer, sources) =
            split_sources("Use clear instructions.\nSOURCES: guide.pdf, tips.pdf");
        assert_eq!(answer, "Use clear instructions.");
        assert_eq!(sources, vec!["guide.pdf", "tips.pdf"]);
    }

    #[test]
    fn test_split_sources_absent() {
        let (answer, sources) = split_sources("  I don't know. ");
        assert_eq!(answer, "I don't know.");
        assert!(sources.is_empty());
    }

    #[test]
    fn test_stuff_prompt_lists_sources() {
        let chunks = vec![MemoryQueryResult {
            id: "0".to_string(),
            text: " page text ".to_string(),
            description: "a.pdf".to_string(),
            relevance: 0.9,
        }];
        let prompt = stuff_prompt("q?", &chunks);
        assert!(prompt.starts_with("QUESTION: q?"));
        assert!(prompt.contains("Content: page text\nSource: a.pdf"));
        assert!(prompt.ends_with("FINAL ANSWER:"));
    }
}
