//! UI rendering for the governance console
//!
//! All view rendering lives here: framework selection, query input, the
//! staged reveal with its consent modal and handoff overlay, the sealed
//! artifact, and the audit pane.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use sphinx_protocol::result::{StagePayload, StageResult};
use sphinx_protocol::stage::{agent_for, StageKey};

use crate::app::{App, Phase};

const GOLD: Color = Color::Yellow;
const DIM: Color = Color::DarkGray;

fn accent_color(accent: &str) -> Color {
    match accent {
        "orange" => Color::LightRed,
        "blue" => Color::Blue,
        "green" => Color::Green,
        "purple" => Color::Magenta,
        "indigo" => Color::LightBlue,
        "gold" => GOLD,
        _ => Color::Gray,
    }
}

/// Main UI rendering function.
pub fn ui(f: &mut Frame, app: &App) {
    let show_audit = app.show_audit && app.phase != Phase::Selection;
    let constraints = if show_audit {
        vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(9),
            Constraint::Length(3),
        ]
    } else {
        vec![
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    render_header(f, chunks[0], app);
    match app.phase {
        Phase::Selection => render_selection(f, chunks[1], app),
        Phase::Input => render_input(f, chunks[1], app),
        Phase::Processing => render_processing(f, chunks[1], app),
        Phase::Complete => render_complete(f, chunks[1], app),
    }
    if show_audit {
        render_audit(f, chunks[2], app);
    }
    render_footer(f, *chunks.last().expect("footer chunk"), app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let framework = app
        .selected_framework()
        .map(|fw| fw.name.clone())
        .unwrap_or_else(|| "No framework".to_string());
    let line = Line::from(vec![
        Span::styled(
            " S.P.H.I.N.X. ",
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        ),
        Span::raw("Governance Console  "),
        Span::styled(format!("[{}]", framework), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(app.phase.label(), Style::default().fg(DIM)),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_selection(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .catalog
        .all()
        .iter()
        .enumerate()
        .map(|(i, fw)| {
            let selected = i == app.selected;
            let marker = if selected { "▸ " } else { "  " };
            let name_style = if selected {
                Style::default().fg(GOLD).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(fw.name.clone(), name_style),
                ]),
                Line::from(Span::styled(
                    format!("    {}", fw.description),
                    Style::default().fg(DIM),
                )),
                Line::from(""),
            ])
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Choose Your Governance Framework "),
    );
    f.render_widget(list, area);
}

fn render_input(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(area);

    let editor_title = if app.request_in_flight {
        " Query (consulting engine...) "
    } else {
        " Query requiring ethical oversight "
    };
    let cursor = if app.request_in_flight { "" } else { "▏" };
    let editor = Paragraph::new(format!("{}{}", app.query, cursor))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(editor_title));
    f.render_widget(editor, chunks[0]);

    let status = if app.request_in_flight {
        Line::from(Span::styled(
            " ◌ Dispatching to the multi-model agent swarm...",
            Style::default().fg(Color::Cyan),
        ))
    } else if let Some(error) = &app.error {
        Line::from(Span::styled(
            format!(" ✗ {}", error),
            Style::default().fg(Color::Red),
        ))
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(status), chunks[1]);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(framework) = app.selected_framework() {
        lines.push(Line::from(Span::styled(
            "Quick try (Tab to cycle):",
            Style::default().fg(DIM),
        )));
        for sample in &framework.sample_queries {
            lines.push(Line::from(format!("  • {}", sample)));
        }
    }
    if !app.history.recent.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Recent (Down to cycle):",
            Style::default().fg(DIM),
        )));
        for query in app.history.recent.iter().take(3) {
            lines.push(Line::from(Span::styled(
                format!("  • {}", query),
                Style::default().fg(Color::Gray),
            )));
        }
    }
    let hints = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Suggestions "));
    f.render_widget(hints, chunks[2]);
}

fn render_processing(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    render_stage_rail(f, chunks[0], app);

    let paused = app
        .reveal
        .as_ref()
        .map(|d| d.machine().is_paused_for_consent())
        .unwrap_or(false);
    if paused {
        render_consent_modal(f, chunks[1], app);
    } else {
        render_stage_content(f, chunks[1], app);
    }
}

fn render_stage_rail(f: &mut Frame, area: Rect, app: &App) {
    let machine = app.reveal.as_ref().map(|d| d.machine());
    let revealed = machine.and_then(|m| m.revealed_through());
    let current = machine.and_then(|m| m.current_stage());

    let mut lines: Vec<Line> = Vec::new();
    for stage in StageKey::ALL {
        let done = revealed.map(|r| stage.index() < r).unwrap_or(false);
        let active = current == Some(stage);
        let marker = if done {
            "✓"
        } else if active {
            "▸"
        } else {
            "·"
        };
        let term = app
            .selected_framework()
            .map(|fw| fw.term_for(stage).to_string())
            .unwrap_or_else(|| stage.title().to_string());
        let agent = agent_for(stage);
        let style = if active {
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD)
        } else if done {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(DIM)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} {} ", marker, stage.letter()), style),
            Span::styled(term, style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("       {}", agent.provider),
            Style::default().fg(accent_color(&agent.accent)),
        )));
    }

    let rail = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Isnād Chain Monitor "),
    );
    f.render_widget(rail, area);
}

/// Content lines for one disclosed stage.
///
/// A missing stage renders a neutral placeholder; the reveal keeps
/// moving regardless.
pub fn stage_summary_lines(stage: Option<&StageResult>) -> Vec<String> {
    let Some(stage) = stage else {
        return vec!["Awaiting stage data...".to_string()];
    };
    match &stage.payload {
        StagePayload::Scrutinize {
            analysis,
            flagged_issues,
        } => {
            let mut lines = vec![analysis.clone()];
            if flagged_issues.is_empty() {
                lines.push("No critical flags found.".to_string());
            } else {
                for issue in flagged_issues {
                    lines.push(format!("! {}", issue));
                }
            }
            lines
        }
        StagePayload::Probe {
            evidence_chain,
            sources_type,
        } => vec![evidence_chain.clone(), format!("Sources: {}", sources_type)],
        StagePayload::Hypothesize {
            alternatives_considered,
            chosen_path,
        } => {
            let mut lines = vec![format!("Chosen path: {}", chosen_path)];
            for alt in alternatives_considered {
                lines.push(format!("~ {}", alt));
            }
            lines
        }
        StagePayload::Investigate {
            ethical_alignment, ..
        } => vec![format!("\"{}\"", ethical_alignment)],
        StagePayload::Narrow { actionable_steps } => actionable_steps
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect(),
        StagePayload::Execute {
            final_attestation,
            handoff_summary,
        } => vec![
            format!("Attestation: {}", final_attestation),
            handoff_summary.clone(),
        ],
    }
}

fn render_stage_content(f: &mut Frame, area: Rect, app: &App) {
    let machine = app.reveal.as_ref().map(|d| d.machine());
    let revealed = machine.and_then(|m| m.revealed_through());
    let current = machine.and_then(|m| m.current_stage());
    let handoff = machine.map(|m| m.is_handoff()).unwrap_or(false);

    let mut lines: Vec<Line> = Vec::new();

    if handoff {
        if let Some(stage) = current {
            let agent = agent_for(stage);
            lines.push(Line::from(vec![
                Span::styled(
                    " ⇄ Initiating handoff protocol: routing to ",
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    agent.name.clone(),
                    Style::default()
                        .fg(accent_color(&agent.accent))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" · {}", agent.role), Style::default().fg(DIM)),
            ]));
            lines.push(Line::from(""));
        }
    }

    if let Some(revealed) = revealed {
        for stage in StageKey::ALL.iter().take(revealed + 1) {
            let term = app
                .selected_framework()
                .map(|fw| fw.term_for(*stage).to_string())
                .unwrap_or_else(|| stage.title().to_string());
            let agent = agent_for(*stage);
            let active = current == Some(*stage);
            let heading_style = if active {
                Style::default().fg(GOLD).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DIM)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{} • {}", stage.letter(), term), heading_style),
                Span::styled(
                    format!("  via {}", agent.name),
                    Style::default().fg(accent_color(&agent.accent)),
                ),
            ]));

            let content = app.analysis.as_ref().and_then(|a| a.stage(*stage));
            for text in stage_summary_lines(content) {
                lines.push(Line::from(format!("    {}", text)));
            }
            lines.push(Line::from(""));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "Initializing analysis...",
            Style::default().fg(DIM),
        )));
    }

    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Protocol Feed "));
    f.render_widget(content, area);
}

fn render_consent_modal(f: &mut Frame, area: Rect, app: &App) {
    let Some(framework) = app.selected_framework() else {
        return;
    };
    let gate_agent = agent_for(StageKey::CONSENT_STAGE);
    let findings = app
        .analysis
        .as_ref()
        .and_then(|a| a.stage(StageKey::CONSENT_STAGE))
        .map(|s| s.payload.headline().to_string())
        .unwrap_or_else(|| "...".to_string());

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", framework.consent_title),
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Analysis provided by: ", Style::default().fg(DIM)),
            Span::styled(
                gate_agent.name.clone(),
                Style::default().fg(accent_color(&gate_agent.accent)),
            ),
        ]),
        Line::from(""),
        Line::from(format!("  {}", framework.consent_description)),
        Line::from(""),
        Line::from(Span::styled("  Ethical findings:", Style::default().fg(DIM))),
        Line::from(Span::styled(
            format!("  \"{}\"", findings),
            Style::default().fg(Color::White).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  [Enter] Authorize & Proceed",
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        )),
    ];

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(GOLD))
                .title(" Consent Required "),
        );
    f.render_widget(modal, area);
}

fn render_complete(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        " ✓ Governance complete. The oversight block has been generated and sealed.",
        Style::default().fg(Color::Green),
    ))];
    lines.push(Line::from(""));

    if let Some(artifact) = &app.artifact {
        for (i, text) in artifact.rendered.lines().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{:>3} ", i + 1), Style::default().fg(DIM)),
                Span::raw(text.to_string()),
            ]));
        }
    }

    if let Some(status) = &app.status_line {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", status),
            Style::default().fg(Color::Cyan),
        )));
    }

    let title = app
        .artifact
        .as_ref()
        .map(|a| format!(" Handoff Oversight Block · {} ", a.meta.id))
        .unwrap_or_else(|| " Handoff Oversight Block ".to_string());
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(body, area);
}

fn render_audit(f: &mut Frame, area: Rect, app: &App) {
    let visible = area.height.saturating_sub(2) as usize;
    let entries = app.audit.entries();
    let start = entries.len().saturating_sub(visible);
    let lines: Vec<Line> = entries[start..]
        .iter()
        .map(|entry| {
            let time = entry.timestamp.get(11..19).unwrap_or("--:--:--");
            let token = entry.token.get(..10).unwrap_or(&entry.token);
            let mut spans = vec![
                Span::styled(format!(" {} ", time), Style::default().fg(DIM)),
                Span::styled(
                    format!("[{}] ", entry.actor.label()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(entry.action.clone()),
            ];
            if let Some(detail) = &entry.detail {
                spans.push(Span::styled(
                    format!(": {}", detail),
                    Style::default().fg(Color::Gray),
                ));
            }
            spans.push(Span::styled(
                format!("  {}…", token),
                Style::default().fg(DIM),
            ));
            Line::from(spans)
        })
        .collect();

    let log = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Immutable Activity Log "),
    );
    f.render_widget(log, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let hints = match app.phase {
        Phase::Selection => " ↑/↓ select · Enter choose · q quit",
        Phase::Input => " type query · Enter submit · Tab samples · ↓ recent · Esc reset",
        Phase::Processing => " Enter grant consent · a audit pane · Esc reset",
        Phase::Complete => " s save · c copy · x export audit · n new inquiry · q quit",
    };
    let footer = Paragraph::new(Line::from(Span::styled(hints, Style::default().fg(DIM))))
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
