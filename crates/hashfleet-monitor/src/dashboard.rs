//! TUI dashboard using ratatui.
//!
//! One render/input loop, separate from the poll workers: snapshot the
//! fleet, redraw, wait up to one tick for a single key event, repeat.
//! Navigation moves a highlighted-row cursor over the host table; when the
//! fleet outgrows the window the viewport scrolls by the minimum amount
//! needed to keep the cursor visible.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

use hashfleet_core::{HostSummary, MiningMode};
use hashfleet_poller::{FleetTotals, HostRow};

/// Rows the table chrome (borders plus the header row) takes from the
/// hosts area.
const TABLE_CHROME_ROWS: u16 = 3;

/// TUI dashboard. Holds the cursor and viewport; the fleet itself arrives
/// fresh through the snapshot closure every frame.
pub struct Dashboard {
    mode: MiningMode,
    tick: Duration,
    cursor: usize,
    offset: usize,
}

impl Dashboard {
    pub fn new(mode: MiningMode, tick_ms: u64) -> Self {
        Self {
            mode,
            tick: Duration::from_millis(tick_ms),
            cursor: 0,
            offset: 0,
        }
    }

    /// Run until the user quits. `get_rows` is called once per frame.
    pub fn run<F>(&mut self, mut get_rows: F) -> io::Result<()>
    where
        F: FnMut() -> Vec<HostRow>,
    {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal, &mut get_rows);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    fn run_loop<F>(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        get_rows: &mut F,
    ) -> io::Result<()>
    where
        F: FnMut() -> Vec<HostRow>,
    {
        loop {
            let rows = get_rows();
            terminal.draw(|f| self.ui(f, &rows))?;

            // At most one key event per frame; the poll doubles as the
            // frame tick so idle CPU stays bounded.
            if event::poll(self.tick)? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key, rows.len()) {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Apply one keystroke. Returns true on a quit key.
    fn handle_key(&mut self, key: KeyEvent, host_count: usize) -> bool {
        let last = host_count.saturating_sub(1);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(last),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = last,
            _ => {}
        }
        false
    }

    /// Clamp the cursor and move the viewport by the minimum amount that
    /// keeps the cursor visible.
    fn scroll_to_cursor(&mut self, host_count: usize, visible: usize) {
        if host_count == 0 {
            self.cursor = 0;
            self.offset = 0;
            return;
        }
        self.cursor = self.cursor.min(host_count - 1);
        let visible = visible.max(1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }
        self.offset = self.offset.min(host_count.saturating_sub(visible));
    }

    fn ui(&mut self, frame: &mut Frame, rows: &[HostRow]) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(5),    // Hosts
                Constraint::Length(4), // Totals / averages
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0], rows);
        self.render_hosts(frame, chunks[1], rows);
        self.render_footer(frame, chunks[2], rows);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, rows: &[HostRow]) {
        let online = rows.iter().filter(|r| r.status.online).count();
        let mode = match self.mode {
            MiningMode::Pool => "pool",
            MiningMode::Solo => "solo",
        };
        let header = Paragraph::new(vec![Line::from(vec![
            Span::styled(
                "Hashfleet Monitor",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" | {mode} mining | {online}/{} online", rows.len())),
            Span::raw(" | arrows/home/end to move, 'q' to quit"),
        ])])
        .block(Block::default().borders(Borders::ALL).title("Fleet"));
        frame.render_widget(header, area);
    }

    fn render_hosts(&mut self, frame: &mut Frame, area: Rect, rows: &[HostRow]) {
        let visible = area.height.saturating_sub(TABLE_CHROME_ROWS) as usize;
        self.scroll_to_cursor(rows.len(), visible);

        let header_cells = column_titles(self.mode)
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells).height(1);

        let end = (self.offset + visible.max(1)).min(rows.len());
        let table_rows = rows[self.offset..end].iter().enumerate().map(|(i, row)| {
            let cells = match &row.status.summary {
                Some(summary) if row.status.online => online_cells(self.mode, &row.host, summary),
                _ => offline_cells(self.mode, &row.host),
            };
            let style = if self.offset + i == self.cursor {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            Row::new(cells.into_iter().map(Cell::from)).style(style)
        });

        let widths: Vec<Constraint> = column_widths(self.mode)
            .iter()
            .map(|w| Constraint::Length(*w))
            .collect();
        let table = Table::new(table_rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Hosts"));

        frame.render_widget(table, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, rows: &[HostRow]) {
        let totals = FleetTotals::compute(rows);
        let footer = Paragraph::new(vec![
            Line::from(average_line(self.mode, &totals)),
            Line::from(total_line(self.mode, &totals)),
        ])
        .block(Block::default().borders(Borders::ALL).title("Fleet totals"));
        frame.render_widget(footer, area);
    }
}

fn column_titles(mode: MiningMode) -> &'static [&'static str] {
    match mode {
        MiningMode::Pool => &[
            "Host",
            "Hashrate H/m",
            "Share %",
            "Accepted S/m",
            "Difficulty",
            "CPUs",
            "Temp °C",
        ],
        MiningMode::Solo => &[
            "Host",
            "Hashrate H/m",
            "Blocks",
            "Difficulty",
            "CPUs",
            "Temp °C",
        ],
    }
}

fn column_widths(mode: MiningMode) -> &'static [u16] {
    match mode {
        MiningMode::Pool => &[15, 13, 8, 12, 10, 5, 7],
        MiningMode::Solo => &[15, 13, 8, 10, 5, 7],
    }
}

/// Cell text for an online host. Every cell is fixed-width so the table
/// never shifts when a host's status flips.
fn online_cells(mode: MiningMode, host: &str, s: &HostSummary) -> Vec<String> {
    let mut cells = vec![
        format!("{host:<15}"),
        format!("{:>13.3}", s.hashes_per_minute()),
    ];
    match mode {
        MiningMode::Pool => {
            cells.push(format!("{:>6.2}%", s.accept_percent()));
            cells.push(format!("{:>12.3}", s.accepted_per_minute));
        }
        MiningMode::Solo => {
            cells.push(format!("{:>8}", s.solved_blocks));
        }
    }
    cells.push(format!("{:>10.6}", s.difficulty));
    cells.push(format!("{:>5}", s.cpu_count));
    cells.push(format!("{:>5.1}°C", s.cpu_temp_c));
    cells
}

/// Dashed placeholder row of identical width; absence of numbers is the
/// whole failure signal.
fn offline_cells(mode: MiningMode, host: &str) -> Vec<String> {
    let mut cells = vec![format!("{host:<15}"), format!("{:>13}", "-----.---")];
    match mode {
        MiningMode::Pool => {
            cells.push(format!("{:>7}", "---.--%"));
            cells.push(format!("{:>12}", "----.---"));
        }
        MiningMode::Solo => {
            cells.push(format!("{:>8}", "------"));
        }
    }
    cells.push(format!("{:>10}", "-.------"));
    cells.push(format!("{:>5}", "----"));
    cells.push(format!("{:>7}", "---.-°C"));
    cells
}

fn average_line(mode: MiningMode, t: &FleetTotals) -> String {
    match mode {
        MiningMode::Pool => format!(
            "Average {:>15.3} H/m  {:>6.2}%  {:>10.3} S/m  {:>10.6}  {:>5.1} CPUs  {:>5.1}°C",
            t.avg_hashes_per_minute,
            t.avg_accept_percent,
            t.avg_accepted_per_minute,
            t.avg_difficulty,
            t.avg_cpu_count,
            t.avg_cpu_temp_c,
        ),
        MiningMode::Solo => format!(
            "Average {:>15.3} H/m  {:>8.1} blocks  {:>10.6}  {:>5.1} CPUs  {:>5.1}°C",
            t.avg_hashes_per_minute,
            t.avg_solved_blocks,
            t.avg_difficulty,
            t.avg_cpu_count,
            t.avg_cpu_temp_c,
        ),
    }
}

fn total_line(mode: MiningMode, t: &FleetTotals) -> String {
    match mode {
        MiningMode::Pool => format!(
            "Total   {:>15.3} H/m  ---.--%  {:>10.3} S/m  {:>10}  {:>5} CPUs  ---.-°C",
            t.total_hashes_per_minute,
            t.total_accepted_per_minute,
            "-.------",
            t.total_cpu_count,
        ),
        MiningMode::Solo => format!(
            "Total   {:>15.3} H/m  {:>8} blocks  {:>10}  {:>5} CPUs  ---.-°C",
            t.total_hashes_per_minute,
            t.total_solved_blocks,
            "-.------",
            t.total_cpu_count,
        ),
    }
}
