use super::*;

fn chunk(content: &str) -> RetrievedChunk {
    RetrievedChunk {
        content: content.to_string(),
        source: "fixture.docx".to_string(),
        similarity_score: 1.0,
        distance: 0.0,
    }
}

#[test]
fn context_joins_chunks_with_blank_lines() {
    let chunks = vec![chunk("First passage."), chunk("Second passage.")];
    assert_eq!(build_context(&chunks), "First passage.\n\nSecond passage.");
}

#[test]
fn context_of_no_chunks_is_empty() {
    assert_eq!(build_context(&[]), "");
}

#[test]
fn prompt_contains_context_and_question() {
    let prompt = fill_prompt("Some retrieved text.", "What is this about?");

    assert!(prompt.contains("Some retrieved text."));
    assert!(prompt.contains("What is this about?"));
    assert!(!prompt.contains("{context}"));
    assert!(!prompt.contains("{question}"));
}

#[test]
fn prompt_places_context_before_question() {
    let prompt = fill_prompt("CONTEXT-BLOCK", "QUESTION-TEXT");

    let context_pos = prompt.find("CONTEXT-BLOCK").expect("context present");
    let question_pos = prompt.find("QUESTION-TEXT").expect("question present");
    assert!(context_pos < question_pos);
}

#[test]
fn each_placeholder_is_filled_exactly_once() {
    let prompt = fill_prompt("repeated", "repeated");
    assert_eq!(prompt.matches("repeated").count(), 2);
}
