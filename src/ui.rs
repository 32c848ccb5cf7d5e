use crate::categories::{all_categories, Category};
use crate::db::{self, Expense};
use crate::format::{format_currency, format_date};
use crate::range::RangeFilter;
use crate::stats;
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

pub struct App {
    pub expenses: Vec<Expense>,
    pub filtered_expenses: Vec<Expense>,
    pub state: TableState,
    pub today: NaiveDate,
    pub currency: String,
    pub range_filter: RangeFilter,
    pub category_filter: Option<Category>,
    pub show_detail: bool,
}

impl App {
    pub fn new(expenses: Vec<Expense>, today: NaiveDate, currency: String) -> Self {
        let mut app = Self {
            expenses,
            filtered_expenses: Vec::new(),
            state: TableState::default(),
            today,
            currency,
            range_filter: RangeFilter::All,
            category_filter: None,
            show_detail: false,
        };
        app.apply_filters();
        app
    }

    /// Re-derive the visible set from the active range and category filters
    pub fn apply_filters(&mut self) {
        let (start, end) = self.range_filter.bounds(self.today);

        self.filtered_expenses = self
            .expenses
            .iter()
            .filter(|e| e.date >= start && e.date <= end)
            .filter(|e| match &self.category_filter {
                Some(category) => &e.category == category,
                None => true,
            })
            .cloned()
            .collect();

        if self.filtered_expenses.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn set_range(&mut self, range: RangeFilter) {
        self.range_filter = range;
        self.apply_filters();
    }

    /// Cycle the category filter: All -> Food -> ... -> Health -> All
    pub fn cycle_category_filter(&mut self) {
        let fixed = all_categories();

        self.category_filter = match &self.category_filter {
            None => fixed.into_iter().next(),
            Some(current) => {
                let pos = fixed.iter().position(|c| c == current);
                match pos {
                    Some(i) if i + 1 < fixed.len() => Some(fixed[i + 1].clone()),
                    _ => None,
                }
            }
        };

        self.apply_filters();
    }

    pub fn toggle_detail(&mut self) {
        if self.selected_expense().is_some() {
            self.show_detail = !self.show_detail;
        }
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.state
            .selected()
            .and_then(|i| self.filtered_expenses.get(i))
    }

    /// Drop a record from both lists after it was deleted from the store
    pub fn remove_expense(&mut self, id: i64) {
        self.expenses.retain(|e| e.id != id);
        let selected = self.state.selected();
        self.apply_filters();

        // Keep the cursor near where it was
        if let Some(i) = selected {
            if !self.filtered_expenses.is_empty() {
                self.state
                    .select(Some(i.min(self.filtered_expenses.len() - 1)));
            }
        }
    }

    pub fn next(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered_expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.state.select(Some(i));
    }
}

/// Run the ledger UI. `conn` is used for deletes triggered from the table.
pub fn run_ui(app: &mut App, conn: &Connection) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, app, conn);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    conn: &Connection,
) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;


        if let Event::Key(key) = event::read()? {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                return Ok(());
            }

            if app.show_detail {
                // Any key closes the detail popup
                app.show_detail = false;
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('j') | KeyCode::Down => app.next(),
                KeyCode::Char('k') | KeyCode::Up => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Char('t') => app.set_range(RangeFilter::Today),
                KeyCode::Char('w') => app.set_range(RangeFilter::Week),
                KeyCode::Char('m') => app.set_range(RangeFilter::Month),
                KeyCode::Char('y') => app.set_range(RangeFilter::Year),
                KeyCode::Char('a') => app.set_range(RangeFilter::All),
                KeyCode::Char('c') => app.cycle_category_filter(),
                KeyCode::Char('d') => {
                    if let Some(id) = app.selected_expense().map(|e| e.id) {
                        db::delete_expense(conn, id)?;
                        app.remove_expense(id);
                    }
                }
                _ => {}
            }
        }
    }
}

fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(4), // summary cards
            Constraint::Min(5),    // expense table
            Constraint::Length(3), // help
        ])
        .split(f.size());

    draw_title(f, app, chunks[0]);
    draw_summary(f, app, chunks[1]);
    draw_table(f, app, chunks[2]);
    draw_help(f, chunks[3]);

    if app.show_detail {
        draw_detail(f, app);
    }
}

fn draw_title(f: &mut Frame, app: &App, area: Rect) {
    let category_label = match &app.category_filter {
        Some(category) => category.name().to_string(),
        None => "All".to_string(),
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            " Spend Analyzer ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "— {} of {} expenses | range: {} | category: {}",
            app.filtered_expenses.len(),
            app.expenses.len(),
            app.range_filter.label(),
            category_label,
        )),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(title, area);
}

fn draw_summary(f: &mut Frame, app: &App, area: Rect) {
    let summary = stats::summarize(&app.expenses, app.today);

    let top = match &summary.top_category {
        Some(entry) => format!(
            "{} {} ({})",
            entry.category.emoji(),
            entry.category.name(),
            format_currency(entry.amount, &app.currency)
        ),
        None => "-".to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Today: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format_currency(summary.today, &app.currency),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled("Week: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format_currency(summary.week, &app.currency),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled("Month: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format_currency(summary.month, &app.currency),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Top category: ", Style::default().fg(Color::DarkGray)),
            Span::raw(top),
        ]),
    ];

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Summary (trailing month) "),
    );

    f.render_widget(block, area);
}

fn draw_table(f: &mut Frame, app: &mut App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("ID"),
        Cell::from("Date"),
        Cell::from("Category"),
        Cell::from("Amount"),
        Cell::from("Note"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = app
        .filtered_expenses
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(e.id.to_string()),
                Cell::from(format_date(e.date, app.today)),
                Cell::from(format!("{} {}", e.category.emoji(), e.category.name())),
                Cell::from(format_currency(e.amount, &app.currency))
                    .style(Style::default().fg(Color::Red)),
                Cell::from(e.note.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" Expenses "))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "q quit | j/k move | Enter detail | d delete | t/w/m/y/a range | c category",
    )
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, area);
}

fn draw_detail(f: &mut Frame, app: &App) {
    let Some(expense) = app.selected_expense() else {
        return;
    };

    let area = centered_rect(60, 40, f.size());

    let updated = match &expense.updated_at {
        Some(ts) => ts.to_rfc3339(),
        None => "never".to_string(),
    };

    let lines = vec![
        Line::from(format!("ID:       {}", expense.id)),
        Line::from(format!(
            "Amount:   {}",
            format_currency(expense.amount, &app.currency)
        )),
        Line::from(format!(
            "Category: {} {}",
            expense.category.emoji(),
            expense.category.name()
        )),
        Line::from(format!("Date:     {}", expense.date)),
        Line::from(format!("Note:     {}", expense.note)),
        Line::from(""),
        Line::from(format!("Created:  {}", expense.created_at.to_rfc3339())),
        Line::from(format!("Updated:  {}", updated)),
    ];

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Expense Detail (any key to close) "),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
