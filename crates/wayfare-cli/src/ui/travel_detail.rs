//! Travel detail pane — right panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

/// Render the detail pane into `area`.
pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(travel) = app.selected_travel() else {
    let block = Block::default()
      .title(" Detail ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new("Travel no longer available.")
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", travel.title()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Invite input bar pinned to the bottom of the pane.
  if app.invite_active && inner.height > 2 {
    let invite_area = Rect {
      x:      inner.x,
      y:      inner.y + inner.height - 1,
      width:  inner.width,
      height: 1,
    };
    inner.height = inner.height.saturating_sub(1);
    f.render_widget(
      Paragraph::new(format!("add member: {}_", app.invite))
        .style(Style::default().fg(Color::Yellow)),
      invite_area,
    );
  }

  let label = |s: &str| {
    Span::styled(
      format!("{s:<14}"),
      Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    )
  };
  let dim = Style::default().fg(Color::DarkGray);

  let mut lines: Vec<Line> = vec![
    Line::from(vec![
      label("when"),
      Span::raw(format!(
        "{} → {}",
        travel.start().format("%Y-%m-%d"),
        travel.end().format("%Y-%m-%d"),
      )),
    ]),
    Line::from(vec![
      label("where"),
      Span::raw(travel.location().name().to_string()),
      Span::styled(
        format!(
          "  ({:.4}, {:.4})",
          travel.location().latitude(),
          travel.location().longitude(),
        ),
        dim,
      ),
    ]),
  ];

  if !travel.description().is_empty() {
    lines.push(Line::from(vec![
      label("about"),
      Span::raw(travel.description().to_string()),
    ]));
  }

  // Participants, with cached profile info where available.
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    format!("Participants ({})", travel.participants().len()),
    Style::default().add_modifier(Modifier::BOLD),
  )));
  for (member, role) in travel.participants() {
    let (name, email) = match app.profiles.get(member.uid()) {
      Some(p) => (p.name.as_str(), p.email.as_str()),
      None => ("—", ""),
    };
    let mut spans = vec![
      Span::styled(format!("  {role:<12}"), Style::default().fg(Color::Cyan)),
      Span::raw(name.to_string()),
    ];
    if !email.is_empty() {
      spans.push(Span::styled(format!("  <{email}>"), dim));
    }
    lines.push(Line::from(spans));
  }

  if !travel.attachments().is_empty() {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      format!("Attachments ({})", travel.attachments().len()),
      Style::default().add_modifier(Modifier::BOLD),
    )));
    for (name, doc_id) in travel.attachments() {
      lines.push(Line::from(vec![
        Span::raw(format!("  {name}")),
        Span::styled(format!("  [{doc_id}]"), dim),
      ]));
    }
  }

  let scroll_offset = app.detail_scroll as u16;
  let para = Paragraph::new(lines).scroll((scroll_offset, 0));
  f.render_widget(para, inner);
}
