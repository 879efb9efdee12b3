
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::answer::AnswerEngine;

/// Shared application state: the answer engine, constructed once at startup
/// and handed to every request read-only.
pub struct AppState {
    pub engine: AnswerEngine,
}

#[derive(Debug, Deserialize)]
struct AskForm {
    #[serde(default)]
    question: String,
}

enum PageOutcome {
    Answer(String),
    Error(String),
}

/// The single-page application: GET renders the form, POST answers.
#[inline]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page).post(ask_question))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
#[inline]
pub async fn serve(bind_addr: &str, state: Arc<AppState>) -> crate::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Serving web form on http://{}", bind_addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index_page() -> Html<String> {
    Html(render_page("", None))
}

async fn ask_question(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AskForm>,
) -> Html<String> {
    let question = form.question.trim();
    if question.is_empty() {
        return Html(render_page("", None));
    }

    // A per-question failure surfaces on the page; the process keeps
    // serving subsequent questions.
    let outcome = match state.engine.ask(question).await {
        Ok(answer) => PageOutcome::Answer(answer),
        Err(err) => {
            error!("Failed to answer question: {}", err);
            PageOutcome::Error(err.to_string())
        }
    };

    Html(render_page(question, Some(&outcome)))
}

fn render_page(question: &str, outcome: Option<&PageOutcome>) -> String {
    let result_block = match outcome {
        Some(PageOutcome::Answer(answer)) => format!(
            "<h2>Answer</h2>\n<blockquote>{}</blockquote>",
            escape_html(answer)
        ),
        Some(PageOutcome::Error(message)) => format!(
            "<div class=\"error\">Something went wrong: {}</div>",
            escape_html(message)
        ),
        None => String::new(),
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>askdocs</title>
<style>
body {{ font-family: sans-serif; background: #f2f0eb; margin: 0; }}
main {{ max-width: 700px; margin: 3rem auto; padding: 2rem; background: #fff;
       border-radius: 1.25rem; box-shadow: 0 0 15px rgba(0,0,0,0.15); }}
h1 {{ text-align: center; font-size: 2rem; }}
form {{ display: flex; gap: 0.5rem; }}
input[type=text] {{ flex: 1; padding: 0.6rem; border: 1px solid #ccc; border-radius: 0.5rem; }}
button {{ padding: 0.6rem 1.2rem; border: none; border-radius: 0.5rem;
         background: #3a6ea5; color: #fff; cursor: pointer; }}
button:disabled {{ background: #9bb3cc; }}
blockquote {{ border-left: 4px solid #3a6ea5; margin: 1rem 0; padding: 0.5rem 1rem;
             background: #f7f9fc; white-space: pre-wrap; }}
.busy {{ color: #666; }}
.error {{ margin-top: 1rem; padding: 0.75rem 1rem; border-radius: 0.5rem;
         background: #fdecea; color: #8a2620; }}
</style>
</head>
<body>
<main>
<h1>Ask the documents</h1>
<form method="post" action="/"
      onsubmit="document.getElementById('busy').style.display='block';
                document.getElementById('submit').disabled=true;">
<input type="text" name="question" placeholder="Type a question"
       value="{question}" autofocus>
<button id="submit" type="submit">Ask</button>
</form>
<p id="busy" class="busy" style="display:none">Thinking&hellip;</p>
{result_block}
</main>
</body>
</html>
"#,
        question = escape_html(question),
        result_block = result_block,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
