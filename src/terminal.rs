//! Terminal front end: a stdin/stdout REPL over one wizard session.

use std::path::PathBuf;

use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::{Control, Element, NoticeLevel, Screen, UserInput, View};
use crate::webhook::ResultContent;
use crate::webhook::response::ResourceResult;
use crate::wizard::{SubmissionState, WizardEngine};

const HELP: &str = "\
Commands:
  <number>        pick an option
  <text>          answer a text step, or send a chat message
  <enter>         continue
  /submit         submit to the webhook
  /continue       continue past the step
  /save [path]    save a generated resource as HTML
  /quit           leave the wizard";

/// A parsed line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(UserInput),
    Save(Option<PathBuf>),
    Help,
    Quit,
}

/// Interpret `line` against what `view` currently offers.
pub fn parse_line(view: &View, line: &str) -> Option<Command> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix('/') {
        let (command, arg) = match rest.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (rest, ""),
        };
        return match command {
            "quit" | "exit" => Some(Command::Quit),
            "help" => Some(Command::Help),
            "save" => Some(Command::Save((!arg.is_empty()).then(|| PathBuf::from(arg)))),
            "submit" => Some(Command::Input(UserInput::Submit)),
            "continue" => Some(Command::Input(UserInput::Continue)),
            _ => None,
        };
    }

    let choices: Vec<(usize, &str)> = view
        .buttons()
        .filter_map(|(label, control, _)| match control {
            Control::Choose { index } => Some((index, label)),
            _ => None,
        })
        .collect();
    if !choices.is_empty() {
        if let Ok(n) = line.parse::<usize>() {
            return n
                .checked_sub(1)
                .map(|index| Command::Input(UserInput::Choose { index }));
        }
        return choices
            .iter()
            .find(|(_, label)| label.eq_ignore_ascii_case(line))
            .map(|(index, _)| Command::Input(UserInput::Choose { index: *index }));
    }

    if view.has_control(Control::Send) {
        if line.is_empty() {
            return None;
        }
        return Some(Command::Input(UserInput::Send {
            message: line.to_string(),
        }));
    }

    if view.has_text_field() {
        return Some(Command::Input(UserInput::Text {
            value: line.to_string(),
        }));
    }

    if line.is_empty() {
        if view.has_control(Control::Continue) {
            return Some(Command::Input(UserInput::Continue));
        }
        if view.has_control(Control::Submit) {
            return Some(Command::Input(UserInput::Submit));
        }
    }
    None
}

/// Plain-text rendering of a screen.
pub fn render_text(screen: &Screen) -> String {
    let mut out = Vec::new();
    match screen {
        Screen::Step(view) => {
            out.push(view.progress.clone());
            out.push(format!("== {} ==", view.title));
            if let Some(description) = &view.description {
                out.push(description.clone());
            }
            out.push(String::new());
            out.extend(view.body.iter().filter_map(element_text));
        }
        Screen::Complete { message, responses } => {
            out.push(message.clone());
            for line in responses {
                out.push(format!("  {}: {}", line.label, line.value));
            }
        }
        Screen::Halted { message } | Screen::LoadFailed { message } => {
            out.push(message.clone())
        }
    }
    out.join("\n")
}

fn element_text(element: &Element) -> Option<String> {
    let text = match element {
        Element::Heading { text } => format!("## {text}"),
        Element::Paragraph { text } => text.clone(),
        Element::Html { content } => strip_tags(content),
        Element::Notice {
            level: NoticeLevel::Info,
            text,
        } => format!("[info] {text}"),
        Element::Notice {
            level: NoticeLevel::Error,
            text,
        } => format!("[error] {text}"),
        Element::Button {
            label,
            control,
            enabled,
        } => {
            if !enabled {
                return Some(format!("  ({label})"));
            }
            match control {
                Control::Choose { index } => format!("  {}) {label}", index + 1),
                Control::Continue => format!("  <enter> {label}"),
                Control::Submit => format!("  /submit {label}"),
                Control::Send => return None,
            }
        }
        Element::TextField {
            label, placeholder, ..
        } => {
            if placeholder.is_empty() {
                label.clone()
            } else {
                format!("{label} ({placeholder})")
            }
        }
        Element::SummaryItem { label, value } => format!("  {label}: {value}"),
        Element::UsageBadge { label, value, low } => {
            if *low {
                format!("[{label}: {value}] running low")
            } else {
                format!("[{label}: {value}]")
            }
        }
        Element::ChatLine { role, content } => {
            let who = match role {
                crate::webhook::ChatRole::System => "system",
                crate::webhook::ChatRole::User => "you",
                crate::webhook::ChatRole::Assistant => "assistant",
            };
            format!("{who}: {content}")
        }
    };
    Some(text)
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// The resource generated on the current step, if there is one.
pub fn current_resource(engine: &WizardEngine) -> Option<&ResourceResult> {
    let step = engine.current_step()?;
    match engine.submission(&step.id)? {
        SubmissionState::Succeeded(result) => match &result.content {
            ResultContent::Resource(resource) => Some(resource),
            _ => None,
        },
        _ => None,
    }
}

/// Write the current resource as a standalone HTML document.
pub async fn save_resource(
    engine: &WizardEngine,
    path: Option<PathBuf>,
) -> std::io::Result<Option<PathBuf>> {
    let Some(resource) = current_resource(engine) else {
        return Ok(None);
    };
    let path = path.unwrap_or_else(|| PathBuf::from(resource.filename()));
    tokio::fs::write(&path, resource.to_html_document()).await?;
    tracing::info!(path = %path.display(), "Resource saved");
    Ok(Some(path))
}

/// Lines typed on stdin, trimmed of the trailing newline.
fn stdin_lines() -> impl Stream<Item = String> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let reader = BufReader::new(tokio::io::stdin());
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    break;
                }
            }
        }
    });

    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|line| (line, rx)) })
}

/// Drive `engine` from stdin until it finishes, the user quits, or input ends.
pub async fn run(engine: &mut WizardEngine) -> std::io::Result<()> {
    let mut lines = Box::pin(stdin_lines());
    let mut screen = engine.render();
    println!("{}\n", render_text(&screen));

    while !engine.is_finished() {
        eprint!("> ");
        let Some(line) = lines.next().await else {
            break;
        };
        let Some(view) = screen.view() else {
            break;
        };

        match parse_line(view, &line) {
            Some(Command::Quit) => break,
            Some(Command::Help) => eprintln!("{HELP}"),
            Some(Command::Save(path)) => match save_resource(engine, path).await? {
                Some(path) => eprintln!("Saved {}", path.display()),
                None => eprintln!("Nothing to save on this step"),
            },
            Some(Command::Input(input)) => {
                screen = engine.dispatch(input).await;
                println!("\n{}\n", render_text(&screen));
            }
            None => eprintln!("Not understood here; /help lists commands"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SummaryLine;

    fn view(body: Vec<Element>) -> View {
        View {
            step_id: "s".to_string(),
            progress: "Step 1 of 2".to_string(),
            title: "Pick".to_string(),
            description: None,
            body,
        }
    }

    fn choice_view() -> View {
        view(vec![
            Element::button("Yes", Control::Choose { index: 0 }),
            Element::button("No", Control::Choose { index: 1 }),
        ])
    }

    #[test]
    fn numbers_and_labels_pick_options() {
        let v = choice_view();
        assert_eq!(
            parse_line(&v, "2"),
            Some(Command::Input(UserInput::Choose { index: 1 }))
        );
        assert_eq!(
            parse_line(&v, "yes"),
            Some(Command::Input(UserInput::Choose { index: 0 }))
        );
        assert_eq!(parse_line(&v, "0"), None);
        assert_eq!(parse_line(&v, "maybe"), None);
    }

    #[test]
    fn text_steps_take_the_line_verbatim() {
        let v = view(vec![
            Element::TextField {
                label: "Enter your response:".to_string(),
                placeholder: String::new(),
                multiline: false,
            },
            Element::button("Continue", Control::Continue),
        ]);
        assert_eq!(
            parse_line(&v, "grow revenue"),
            Some(Command::Input(UserInput::Text {
                value: "grow revenue".to_string()
            }))
        );
        assert_eq!(
            parse_line(&v, ""),
            Some(Command::Input(UserInput::Text {
                value: String::new()
            }))
        );
    }

    #[test]
    fn chat_lines_are_sent() {
        let v = view(vec![
            Element::TextField {
                label: "Message".to_string(),
                placeholder: String::new(),
                multiline: false,
            },
            Element::button("Send", Control::Send),
            Element::button("Continue", Control::Continue),
        ]);
        assert_eq!(
            parse_line(&v, "hello"),
            Some(Command::Input(UserInput::Send {
                message: "hello".to_string()
            }))
        );
        assert_eq!(
            parse_line(&v, "/continue"),
            Some(Command::Input(UserInput::Continue))
        );
        assert_eq!(parse_line(&v, ""), None);
    }

    #[test]
    fn slash_commands() {
        let v = choice_view();
        assert_eq!(parse_line(&v, "/quit"), Some(Command::Quit));
        assert_eq!(parse_line(&v, "/save"), Some(Command::Save(None)));
        assert_eq!(
            parse_line(&v, "/save out/plan.html"),
            Some(Command::Save(Some(PathBuf::from("out/plan.html"))))
        );
        assert_eq!(parse_line(&v, "/submit"), Some(Command::Input(UserInput::Submit)));
        assert_eq!(parse_line(&v, "/bogus"), None);
    }

    #[test]
    fn enter_continues_or_submits() {
        let v = view(vec![Element::button("Continue", Control::Continue)]);
        assert_eq!(parse_line(&v, ""), Some(Command::Input(UserInput::Continue)));
        let v = view(vec![Element::button("Take Assessment", Control::Submit)]);
        assert_eq!(parse_line(&v, ""), Some(Command::Input(UserInput::Submit)));
    }

    #[test]
    fn renders_step_screen() {
        let text = render_text(&Screen::Step(choice_view()));
        assert!(text.starts_with("Step 1 of 2\n== Pick =="));
        assert!(text.contains("  1) Yes"));
        assert!(text.contains("  2) No"));
    }

    #[test]
    fn renders_completion_and_errors() {
        let text = render_text(&Screen::Complete {
            message: "All done!".to_string(),
            responses: vec![SummaryLine {
                step_id: "a".to_string(),
                label: "Ready?".to_string(),
                value: "y".to_string(),
            }],
        });
        assert_eq!(text, "All done!\n  Ready?: y");

        let text = render_text(&Screen::Step(view(vec![Element::error("Error: boom. Please try again.")])));
        assert!(text.contains("[error] Error: boom. Please try again."));

        let text = render_text(&Screen::load_failed("HTTP 404"));
        assert_eq!(text, "Error loading resources: HTTP 404");
    }

    #[test]
    fn html_is_flattened() {
        assert_eq!(strip_tags("<p>Hello <b>there</b></p>"), "Hello there");
    }
}
