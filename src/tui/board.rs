//! Kanban board interface.
//!
//! Tasks are laid out in the four workflow columns. Moving a card applies the
//! change at once through the transition controller and sends it to the store
//! in the background; the answer arrives on a channel and is picked up on the
//! next tick, either highlighting the card or reverting the board.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::board::{project_board, Board};
use crate::controller::{Outcome, Transition, TransitionController};
use crate::dates::{utc_today, DueIndicator};
use crate::fields::{Status, VisibilityAction};
use crate::store::StoreError;
use crate::task::Task;
use crate::tui::colors::{status_color, text_on, DARK_RED, HIGHLIGHT};

const CARD_HEIGHT: usize = 5;
const TITLE_LINES: usize = 2;

/// Answers from background work, drained on every tick.
#[derive(Debug)]
pub enum BoardEvent {
    Settled { task_id: String, outcome: Outcome },
    Refreshed(Result<(), StoreError>),
}

/// Main board application state
pub struct BoardApp {
    controller: TransitionController,
    handle: Handle,
    project_id: String,
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: [usize; 4],
    status_message: String,
    status_is_error: bool,
    show_task_detail: bool,
    pending: usize,
    seen_version: Option<u64>,
    events_tx: UnboundedSender<BoardEvent>,
    events_rx: UnboundedReceiver<BoardEvent>,

    // Card ids per column, in display order
    columns: [Vec<String>; 4],
}

/// Task ids of each board column.
fn column_ids(board: &Board<'_>) -> [Vec<String>; 4] {
    let mut ids: [Vec<String>; 4] = Default::default();
    for (status, column) in board.columns() {
        ids[status.column()] = column.iter().map(|t| t.id.clone()).collect();
    }
    ids
}

/// Column reached by stepping `delta` columns from `column`, if on the board.
fn step_column(column: usize, delta: isize) -> Option<usize> {
    let target = column.checked_add_signed(delta)?;
    (target < Status::ALL.len()).then_some(target)
}

/// Word-wrap a title to `width`, keeping at most `max_lines` lines.
fn wrap_title(title: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in title.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            if lines.len() >= max_lines {
                return lines;
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    lines
}

fn assignee_names(task: &Task) -> String {
    if task.assignees.is_empty() {
        return "-".to_string();
    }
    task.assignees
        .iter()
        .map(|a| a.full_name.as_deref().unwrap_or("Unnamed"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl BoardApp {
    /// Create a board over the controller's current tasks.
    pub fn new(controller: TransitionController, project_id: String, handle: Handle) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        let mut app = BoardApp {
            controller,
            handle,
            project_id,
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: [0; 4],
            status_message: String::new(),
            status_is_error: false,
            show_task_detail: false,
            pending: 0,
            seen_version: None,
            events_tx,
            events_rx,
            columns: Default::default(),
        };
        app.sync_columns();
        app
    }

    /// Rebuild the column ids when the controller's collection changed,
    /// keeping the selected card selected if it is still on the board.
    fn sync_columns(&mut self) {
        if self.seen_version == Some(self.controller.version()) {
            return;
        }
        let snapshot = self.controller.snapshot();
        self.sync_with(&project_board(&snapshot.tasks), snapshot.version);
    }

    /// Take the column ids from `board`, built at `version`.
    fn sync_with(&mut self, board: &Board<'_>, version: u64) {
        if self.seen_version == Some(version) {
            return;
        }
        self.seen_version = Some(version);

        let position = self.selected_task_id().and_then(|id| board.position(&id));
        self.columns = column_ids(board);

        if let Some((status, card)) = position {
            self.selected_column = status.column();
            self.selected_card = card;
        }
        self.clamp_selection();
    }

    /// Ensure selected column and card indices are valid
    fn clamp_selection(&mut self) {
        if self.selected_column >= self.columns.len() {
            self.selected_column = 0;
        }

        let column_len = self.columns[self.selected_column].len();
        if column_len == 0 {
            self.selected_card = 0;
            self.column_scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }
    }

    fn selected_task_id(&self) -> Option<String> {
        self.columns[self.selected_column].get(self.selected_card).cloned()
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
        self.status_is_error = false;
    }

    fn set_error_message(&mut self, msg: String) {
        self.status_message = msg;
        self.status_is_error = true;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
        self.status_is_error = false;
    }

    /// Send an applied transition to the store without blocking the UI.
    fn dispatch(&mut self, transition: Transition) {
        self.pending += 1;
        let controller = self.controller.clone();
        let tx = self.events_tx.clone();
        let task_id = transition.task_id.clone();
        self.handle.spawn(async move {
            let outcome = controller.complete(transition).await;
            if tx.send(BoardEvent::Settled { task_id, outcome }).is_err() {
                debug!("board closed before the store answered");
            }
        });
    }

    fn request_refresh(&mut self) {
        let controller = self.controller.clone();
        let project_id = self.project_id.clone();
        let tx = self.events_tx.clone();
        self.handle.spawn(async move {
            let result = controller.refresh(&project_id).await;
            if tx.send(BoardEvent::Refreshed(result)).is_err() {
                debug!("board closed before the refresh finished");
            }
        });
    }

    /// Move the selected card `delta` columns to the left or right.
    fn move_card(&mut self, delta: isize) {
        let Some(task_id) = self.selected_task_id() else {
            return;
        };
        let Some(target) = step_column(self.selected_column, delta) else {
            return;
        };
        let from = Status::ALL[self.selected_column];
        let to = Status::ALL[target];

        if let Some(transition) = self.controller.begin_move(&task_id, from, to) {
            self.dispatch(transition);
            self.sync_columns();
            self.set_status_message(format!("Moved #{} to {}", task_id, to.label()));
        }
    }

    /// Archive or trash the selected card. It leaves the board at once.
    fn change_visibility(&mut self, action: VisibilityAction) {
        let Some(task_id) = self.selected_task_id() else {
            return;
        };
        if let Some(transition) = self.controller.begin_visibility(&task_id, action) {
            self.dispatch(transition);
            self.show_task_detail = false;
            self.sync_columns();
            self.set_status_message(format!("#{} {}", task_id, action.target().label().to_lowercase()));
        }
    }

    /// Apply background answers and expire the highlight.
    pub fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                BoardEvent::Settled { task_id, outcome } => {
                    self.pending = self.pending.saturating_sub(1);
                    match outcome {
                        Outcome::Confirmed(_) | Outcome::Unchanged => {}
                        Outcome::RolledBack(err) => {
                            self.set_error_message(format!("Change to #{} reverted: {}", task_id, err));
                        }
                    }
                }
                BoardEvent::Refreshed(Ok(())) => {}
                BoardEvent::Refreshed(Err(err)) => {
                    warn!(error = %err, "board refresh failed");
                    self.set_error_message(format!("Refresh failed: {}", err));
                }
            }
        }

        self.controller.clear_expired_highlight(Instant::now());
        if self.controller.take_refresh_request() {
            self.request_refresh();
        }
        self.sync_columns();
    }

    /// Handle a key press. Returns true when the board should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if !self.status_is_error {
            self.clear_status_message();
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') | KeyCode::Esc => return true,

            KeyCode::Enter => {
                self.show_task_detail = !self.show_task_detail && self.selected_task_id().is_some();
            }

            // Card movement between columns (check first, before regular navigation)
            KeyCode::Left if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(-1),
            KeyCode::Right if key.modifiers.contains(KeyModifiers::CONTROL) => self.move_card(1),
            KeyCode::Char('H') => self.move_card(-1),
            KeyCode::Char('L') => self.move_card(1),

            KeyCode::Left | KeyCode::Char('h') => {
                if let Some(target) = step_column(self.selected_column, -1) {
                    self.selected_column = target;
                    self.clamp_selection();
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some(target) = step_column(self.selected_column, 1) {
                    self.selected_column = target;
                    self.clamp_selection();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let column_len = self.columns[self.selected_column].len();
                if self.selected_card + 1 < column_len {
                    self.selected_card += 1;
                }
            }

            KeyCode::Char('a') => self.change_visibility(VisibilityAction::Archive),
            KeyCode::Char('t') => self.change_visibility(VisibilityAction::Trash),
            KeyCode::Char('r') => {
                self.request_refresh();
                self.set_status_message("Refreshing…".to_string());
            }
            KeyCode::Char('?') => {
                self.set_status_message(
                    "Help: ←→/hl: Column | ↑↓/jk: Card | Ctrl+←→/HL: Move | Enter: Details | a: Archive | t: Trash | r: Refresh | q: Quit"
                        .to_string(),
                );
            }
            _ => {}
        }
        false
    }

    /// Handle keyboard input
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                return Ok(self.handle_key(key));
            }
        }
        Ok(false)
    }

    /// Render the board
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        // Selection and cards must come from the same snapshot; background
        // answers can change the controller between tick and draw.
        let snapshot = self.controller.snapshot();
        let board = project_board(&snapshot.tasks);
        self.sync_with(&board, snapshot.version);
        let highlighted = self.controller.highlighted(Instant::now());

        self.render_header(f, chunks[0], &board);
        self.render_board(f, chunks[1], &board, highlighted.as_deref());
        self.render_status_bar(f, chunks[2], &board);

        if self.show_task_detail {
            if let Some((status, card)) = self.selected_task_id().and_then(|id| board.position(&id)) {
                self.render_task_detail_popup(f, board.column(status)[card]);
            }
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect, board: &Board<'_>) {
        let header_text = vec![Line::from(vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("Project: {}  Tasks: {}", self.project_id, board.total()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect, board: &Board<'_>, highlighted: Option<&str>) {
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); 4])
            .split(area);

        for (status, &column_area) in Status::ALL.iter().zip(columns_layout.iter()) {
            self.render_column(f, column_area, *status, board.column(*status), highlighted);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, status: Status, cards: &[&Task], highlighted: Option<&str>) {
        let column_index = status.column();
        let is_selected = column_index == self.selected_column;
        let color = status_color(status);

        let border_style = if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({})", status.label(), cards.len()))
            .border_style(border_style);

        let inner = block.inner(area);
        f.render_widget(block, area);

        if cards.is_empty() {
            return;
        }

        let available_height = inner.height as usize;
        let visible_cards = available_height / CARD_HEIGHT;

        // Keep the selected card inside the visible window
        let start_visible = self.column_scroll_offsets[column_index];
        let scroll_offset = if !is_selected {
            start_visible
        } else if self.selected_card < start_visible {
            self.selected_card
        } else if visible_cards > 0 && self.selected_card >= start_visible + visible_cards {
            self.selected_card + 1 - visible_cards
        } else {
            start_visible
        };
        let scroll_offset = scroll_offset.min(cards.len() - 1);
        self.column_scroll_offsets[column_index] = scroll_offset;

        let today = utc_today();
        let mut rendered_cards = 0;
        for (card_index, task) in cards.iter().enumerate().skip(scroll_offset) {
            let y = rendered_cards * CARD_HEIGHT;
            if y + CARD_HEIGHT > available_height {
                break;
            }
            let card_area = Rect {
                x: inner.x,
                y: inner.y + y as u16,
                width: inner.width,
                height: CARD_HEIGHT as u16,
            };
            let selected = is_selected && card_index == self.selected_card;
            let lit = highlighted == Some(task.id.as_str());
            render_card(f, card_area, task, color, selected, lit, today);
            rendered_cards += 1;
        }

        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{} above", scroll_offset)).style(Style::default().fg(Color::Cyan));
            f.render_widget(indicator, Rect { height: 1, ..inner });
        }

        let remaining = cards.len().saturating_sub(scroll_offset + rendered_cards);
        if remaining > 0 {
            let indicator = Paragraph::new(format!("▼ +{} below", remaining)).style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    y: inner.y + inner.height.saturating_sub(1),
                    height: 1,
                    ..inner
                },
            );
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect, board: &Board<'_>) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let pending = if self.pending > 0 {
                format!(" [{} saving]", self.pending)
            } else {
                String::new()
            };
            format!(
                "Tasks: {}{} | Ctrl+←→: Move | Enter: Details | a: Archive | t: Trash | r: Refresh | ?: Help",
                board.total(),
                pending
            )
        };

        let bg = if self.status_is_error {
            DARK_RED
        } else {
            status_color(Status::ALL[self.selected_column])
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(bg).fg(text_on(bg)))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_task_detail_popup(&self, f: &mut Frame, task: &Task) {
        let popup_area = {
            let area = f.area();
            let popup_width = (area.width * 80) / 100;
            let popup_height = (area.height * 80) / 100;
            let x = (area.width - popup_width) / 2;
            let y = (area.height - popup_height) / 2;
            Rect::new(x, y, popup_width, popup_height)
        };
        f.render_widget(Clear, popup_area);

        let today = utc_today();
        let due = match DueIndicator::for_due(task.due_date.as_deref(), today) {
            Some(indicator) => format!("{} ({})", task.due_date.as_deref().unwrap_or("-"), indicator.label()),
            None => format!("{} (unreadable)", task.due_date.as_deref().unwrap_or("-")),
        };
        let status = task.workflow_status().map(|s| s.label()).unwrap_or("-");

        let detail_lines = vec![
            Line::from(vec![Span::styled(
                format!("Task #{}: {}", task.id, task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(format!("Status:     {}", status)),
            Line::from(format!("Visibility: {}", task.visibility.label())),
            Line::from(format!("Start:      {}", task.start_date.as_deref().unwrap_or("-"))),
            Line::from(format!("Due:        {}", due)),
            Line::from(format!("Assignees:  {}", assignee_names(task))),
            Line::from(format!("Created:    {}", task.created_at)),
            Line::from(format!("Updated:    {}", if task.updated_at.is_empty() { "-" } else { &task.updated_at })),
            Line::from(""),
            Line::from("Description:"),
            Line::from(task.description.as_deref().unwrap_or("-")),
        ];

        let color = task.workflow_status().map(status_color).unwrap_or(Color::Gray);
        let popup_block = Block::default()
            .borders(Borders::ALL)
            .title("Task Details (Press Enter to close)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(color).add_modifier(Modifier::BOLD));

        let popup_paragraph = Paragraph::new(detail_lines)
            .block(popup_block)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup_paragraph, popup_area);
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.tick();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Render a single task card
fn render_card(
    f: &mut Frame,
    area: Rect,
    task: &Task,
    color: Color,
    is_selected: bool,
    highlighted: bool,
    today: chrono::NaiveDate,
) {
    let style = if is_selected {
        Style::default().bg(color).fg(text_on(color)).add_modifier(Modifier::BOLD)
    } else if highlighted {
        Style::default().bg(HIGHLIGHT).fg(Color::Black)
    } else {
        Style::default().bg(Color::DarkGray)
    };

    let mut card_text = vec![Line::from(format!("#{}", task.id))];
    let width = area.width.saturating_sub(2) as usize;
    card_text.extend(wrap_title(&task.title, width, TITLE_LINES).into_iter().map(Line::from));

    let due = DueIndicator::for_due(task.due_date.as_deref(), today)
        .map(|d| d.label())
        .unwrap_or_else(|| "-".to_string());
    card_text.push(Line::from(format!("{} | {}", due, assignee_names(task))));

    let card_block = Paragraph::new(card_text)
        .block(Block::default().borders(Borders::ALL))
        .style(style)
        .wrap(Wrap { trim: true });
    f.render_widget(card_block, area);
}
