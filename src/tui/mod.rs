use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

use crate::api::{ApiError, FundApi};
use crate::config::ResolvedConfig;
use crate::debounce::Debounced;
use crate::format::{
    format_date, format_number, format_percent, truncate, PriceTrend, TradeStatusClass,
    PLACEHOLDER,
};
use crate::models::FundRecord;
use crate::pipeline::{Dashboard, LoadState, Pipeline, SearchRequest, ViewSource};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const NAME_WIDTH: usize = 40;
const CLASS_WIDTH: usize = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    Search,
}

/// Results delivered to the event loop from timers and background requests.
enum UiEvent {
    SearchDue(String),
    SearchDone(SearchRequest, Result<Vec<FundRecord>, ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    CloseDetail,
    StartSearch,
    StopSearch,
    SearchInput(char),
    SearchBackspace,
    NextClass,
    PrevClass,
    CycleSort,
    ToggleOrder,
    Reload,
    Export,
    OpenDetail,
    Up,
    Down,
    Nothing,
}

enum Detail {
    Loaded(Box<FundRecord>),
    Failed { ticker: String, message: String },
}

#[derive(Default)]
struct UiState {
    mode: InputMode,
    table: TableState,
    detail: Option<Detail>,
    status: Option<String>,
}

fn key_action(code: KeyCode, mode: InputMode, detail_open: bool) -> Action {
    if mode == InputMode::Search {
        return match code {
            KeyCode::Esc | KeyCode::Enter => Action::StopSearch,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Char(c) => Action::SearchInput(c),
            _ => Action::Nothing,
        };
    }
    if detail_open {
        return match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Action::CloseDetail,
            _ => Action::Nothing,
        };
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('/') => Action::StartSearch,
        KeyCode::Char('a') => Action::NextClass,
        KeyCode::Char('A') => Action::PrevClass,
        KeyCode::Char('s') => Action::CycleSort,
        KeyCode::Char('o') => Action::ToggleOrder,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('e') => Action::Export,
        KeyCode::Enter => Action::OpenDetail,
        KeyCode::Up | KeyCode::Char('k') => Action::Up,
        KeyCode::Down | KeyCode::Char('j') => Action::Down,
        _ => Action::Nothing,
    }
}

/// The asset class after (or before) `current`, wrapping around.
fn cycle_class<'a>(options: &'a [String], current: &str, forward: bool) -> Option<&'a str> {
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let idx = options.iter().position(|c| c == current);
    let next = match (idx, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, _) => 0,
    };
    options.get(next).map(String::as_str)
}

pub async fn run_tui(api: Arc<dyn FundApi>, config: &ResolvedConfig) -> Result<()> {
    let mut dashboard = Dashboard::new(api, config.dashboard.initial_criteria());

    let mut terminal = enter_terminal()?;
    let result = run_event_loop(&mut terminal, &mut dashboard, config).await;
    leave_terminal(&mut terminal)?;
    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &mut Dashboard,
    config: &ResolvedConfig,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<UiEvent>();
    let search_tx = tx.clone();
    let debounced = Debounced::new(config.dashboard.search_debounce, move |term: String| {
        let _ = search_tx.send(UiEvent::SearchDue(term));
    });
    let mut ui = UiState::default();
    ui.table.select(Some(0));

    terminal.draw(|frame| render(frame, dashboard.pipeline(), &mut ui))?;
    dashboard.initial_load().await;

    loop {
        while let Ok(event) = rx.try_recv() {
            handle_ui_event(event, dashboard, &tx);
        }

        clamp_selection(dashboard.pipeline().view().len(), &mut ui.table);
        terminal.draw(|frame| render(frame, dashboard.pipeline(), &mut ui))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let failed = matches!(dashboard.pipeline().load_state(), LoadState::Failed(_));
        let action = key_action(key.code, ui.mode, ui.detail.is_some());
        if failed && !matches!(action, Action::Quit | Action::Reload) {
            continue;
        }

        match action {
            Action::Quit => return Ok(()),
            Action::Nothing => {}
            Action::CloseDetail => ui.detail = None,
            Action::StartSearch => ui.mode = InputMode::Search,
            Action::StopSearch => ui.mode = InputMode::Normal,
            Action::SearchInput(c) => {
                let mut term = dashboard.pipeline().criteria().search_term.clone();
                term.push(c);
                dashboard.pipeline_mut().set_search_input(term.clone());
                debounced.call(term);
            }
            Action::SearchBackspace => {
                let mut term = dashboard.pipeline().criteria().search_term.clone();
                term.pop();
                dashboard.pipeline_mut().set_search_input(term.clone());
                debounced.call(term);
            }
            Action::NextClass | Action::PrevClass => {
                let pipeline = dashboard.pipeline();
                let next = cycle_class(
                    pipeline.asset_classes(),
                    &pipeline.criteria().selected_asset_class,
                    action == Action::NextClass,
                )
                .map(ToOwned::to_owned);
                if let Some(class) = next {
                    debounced.cancel();
                    dashboard.select_asset_class(class);
                    ui.table.select(Some(0));
                }
            }
            Action::CycleSort => {
                debounced.cancel();
                let next = dashboard.pipeline().criteria().sort_by.next();
                draw_loading(terminal)?;
                dashboard.set_sort_by(next).await;
            }
            Action::ToggleOrder => {
                debounced.cancel();
                draw_loading(terminal)?;
                dashboard.toggle_sort_order().await;
            }
            Action::Reload => {
                debounced.cancel();
                draw_loading(terminal)?;
                dashboard.reload().await;
            }
            Action::Export => {
                let today = Utc::now().date_naive();
                ui.status = Some(
                    match dashboard.export_view(&config.export_dir, &config.export_prefix, today) {
                        Ok(path) => format!("Экспортировано: {}", path.display()),
                        Err(err) => format!("Ошибка экспорта: {err:#}"),
                    },
                );
            }
            Action::OpenDetail => {
                let ticker = ui
                    .table
                    .selected()
                    .and_then(|idx| dashboard.pipeline().view().get(idx))
                    .map(|record| record.ticker.clone());
                if let Some(ticker) = ticker {
                    ui.detail = Some(match dashboard.lookup(&ticker).await {
                        Ok(record) => Detail::Loaded(Box::new(record)),
                        Err(err) => Detail::Failed {
                            ticker,
                            message: err.to_string(),
                        },
                    });
                }
            }
            Action::Up => select_prev(dashboard.pipeline().view().len(), &mut ui.table),
            Action::Down => select_next(dashboard.pipeline().view().len(), &mut ui.table),
        }
    }
}

fn handle_ui_event(event: UiEvent, dashboard: &mut Dashboard, tx: &UnboundedSender<UiEvent>) {
    match event {
        UiEvent::SearchDue(term) => {
            if dashboard.pipeline().criteria().search_term != term {
                debug!(%term, "Skipping search for outdated input");
                return;
            }
            let Some(request) = dashboard.pipeline_mut().request_search(&term) else {
                return;
            };
            let api = dashboard.api();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = api.search(&request.term).await;
                let _ = tx.send(UiEvent::SearchDone(request, result));
            });
        }
        UiEvent::SearchDone(request, result) => {
            dashboard.pipeline_mut().apply_search(request, result);
        }
    }
}

fn draw_loading(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    terminal.draw(|frame| {
        let area = frame.area();
        render_loading(frame, area);
    })?;
    Ok(())
}

fn render(frame: &mut Frame<'_>, pipeline: &Pipeline, ui: &mut UiState) {
    match pipeline.load_state() {
        LoadState::Loading => {
            let area = frame.area();
            render_loading(frame, area);
        }
        LoadState::Failed(message) => render_error(frame, message),
        LoadState::Ready => render_dashboard(frame, pipeline, ui),
    }
}

fn render_loading(frame: &mut Frame<'_>, area: Rect) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);
    let paragraph = Paragraph::new("Загрузка данных...")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("ETF Dashboard"));
    frame.render_widget(paragraph, middle);
}

fn render_error(frame: &mut Frame<'_>, message: &str) {
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(6),
        Constraint::Fill(1),
    ])
    .areas(frame.area());
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        )),
        Line::from(""),
        Line::from("r: попробовать снова | q: выход"),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Ошибка подключения"),
    );
    frame.render_widget(paragraph, middle);
}

fn render_dashboard(frame: &mut Frame<'_>, pipeline: &Pipeline, ui: &mut UiState) {
    let [stats_area, filter_area, table_area, footer_area, help_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    render_stats(frame, pipeline, stats_area);
    render_filters(frame, pipeline, ui.mode, filter_area);

    if pipeline.view().is_empty() {
        let empty = Paragraph::new(vec![
            Line::from("Нет данных для отображения"),
            Line::from(Span::styled(
                "Попробуйте изменить параметры фильтрации",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Фонды"));
        frame.render_widget(empty, table_area);
    } else {
        render_table(frame, pipeline.view(), &mut ui.table, table_area);
    }

    let mut footer = vec![Span::raw(format!(
        "Последнее обновление: {} | Найдено записей: {}",
        pipeline.global_stats().last_update,
        pipeline.view().len()
    ))];
    if let Some(status) = ui.status.as_deref() {
        footer.push(Span::styled(
            format!(" | {status}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    let footer = Paragraph::new(Line::from(footer))
        .block(Block::default().borders(Borders::ALL).title("Статус"));
    frame.render_widget(footer, footer_area);

    let help = Paragraph::new(
        "q/esc quit | / search | a/A asset class | s sort | o order | r reload | e export csv | enter details | j/k move",
    )
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    frame.render_widget(help, help_area);

    if let Some(detail) = ui.detail.as_ref() {
        render_detail(frame, detail, table_area);
    }
}

fn render_stats(frame: &mut Frame<'_>, pipeline: &Pipeline, area: Rect) {
    let [global_area, display_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);

    let global = pipeline.global_stats();
    let global_card = Paragraph::new(stats_lines(
        global.total_funds.to_string(),
        global.total_nav,
        global.avg_ter,
    ))
    .block(Block::default().borders(Borders::ALL).title("Всего на бирже"));
    frame.render_widget(global_card, global_area);

    let display = pipeline.display_stats();
    let display_card = Paragraph::new(stats_lines(
        display.total_funds.to_string(),
        display.total_nav,
        display.avg_ter,
    ))
    .block(Block::default().borders(Borders::ALL).title("В выборке"));
    frame.render_widget(display_card, display_area);
}

fn stats_lines(funds: String, total_nav: f64, avg_ter: f64) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    vec![
        Line::from(vec![Span::raw("Фондов: "), Span::styled(funds, bold)]),
        Line::from(vec![
            Span::raw("СЧА, млн ₽: "),
            Span::styled(format_number(Some(total_nav), 0), bold),
        ]),
        Line::from(vec![
            Span::raw("Средний TER: "),
            Span::styled(format!("{avg_ter:.2}%"), bold),
        ]),
    ]
}

fn render_filters(frame: &mut Frame<'_>, pipeline: &Pipeline, mode: InputMode, area: Rect) {
    let criteria = pipeline.criteria();
    let search_style = if mode == InputMode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let cursor = if mode == InputMode::Search { "_" } else { "" };
    let source = match pipeline.view_source() {
        ViewSource::Search(term) => format!(" (поиск: {term})"),
        ViewSource::Local => String::new(),
    };

    let line = Line::from(vec![
        Span::raw("Поиск: "),
        Span::styled(format!("{}{cursor}", criteria.search_term), search_style),
        Span::raw(format!(
            " | Класс: {} | Сортировка: {} {}{source}",
            criteria.selected_asset_class,
            criteria.sort_by.label(),
            criteria.sort_order.arrow(),
        )),
    ]);
    let filters =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Фильтры"));
    frame.render_widget(filters, area);
}

fn render_table(frame: &mut Frame<'_>, view: &[FundRecord], state: &mut TableState, area: Rect) {
    let rows = view.iter().map(|fund| {
        Row::new(vec![
            Cell::from(fund.ticker.clone()).style(
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::from(truncate(&fund.fund_name, NAME_WIDTH)),
            Cell::from(fund.management_co.clone()),
            Cell::from(truncate(&fund.asset_class, CLASS_WIDTH)),
            Cell::from(ter_cell(fund.ter_percent)),
            Cell::from(format_number(fund.nav_million_rub, 0)),
            Cell::from(format_percent(fund.price_change_6m, 2))
                .style(trend_style(fund.price_change_6m)),
            Cell::from(format_percent(fund.price_change_2024, 2))
                .style(trend_style(fund.price_change_2024)),
            Cell::from(fund.trade_status.clone()).style(status_style(&fund.trade_status)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(CLASS_WIDTH as u16),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new([
            "Тикер",
            "Название",
            "УК",
            "Класс активов",
            "TER %",
            "СЧА млн ₽",
            "6М %",
            "2024 %",
            "Статус",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Фонды"))
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol(">> ");
    frame.render_stateful_widget(table, area, state);
}

fn render_detail(frame: &mut Frame<'_>, detail: &Detail, area: Rect) {
    let (title, lines) = match detail {
        Detail::Loaded(record) => (record.ticker.clone(), detail_lines(record)),
        Detail::Failed { ticker, message } => (
            ticker.clone(),
            vec![Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            ))],
        ),
    };

    let popup = centered(area, 80, 90);
    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{title} (esc: закрыть)")),
    );
    frame.render_widget(paragraph, popup);
}

fn detail_lines(record: &FundRecord) -> Vec<Line<'static>> {
    fn field(label: &str, value: &str) -> Line<'static> {
        let value = if value.trim().is_empty() {
            PLACEHOLDER.to_string()
        } else {
            value.to_string()
        };
        Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
            Span::raw(value),
        ])
    }

    let mut lines = vec![
        field("Название", &record.fund_name),
        field("УК", &record.management_co),
        field("Класс активов", &record.asset_class),
        field("Статус", &record.trade_status),
        field("Стиль управления", &record.management_style),
        field("Индекс", &record.target_index),
        field("Валюта", &record.currency),
        field("Дата запуска", &record.start_date),
        field("TER %", &ter_cell(record.ter_percent)),
        field("Динамика TER", &record.ter_direction),
        field("СЧА, млн ₽", &format_number(record.nav_million_rub, 2)),
        field("Изм. 6М %", &format_percent(record.price_change_6m, 2)),
    ];
    lines.extend(
        record
            .yearly_changes()
            .into_iter()
            .map(|(year, change)| field(&format!("Изм. {year} %"), &format_percent(change, 2))),
    );
    lines.push(field(
        "Обновлено",
        &format_date(Some(record.last_update_date.as_str())),
    ));
    lines
}

fn ter_cell(ter: Option<f64>) -> String {
    ter.map(|t| format!("{t:.2}"))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn trend_style(value: Option<f64>) -> Style {
    match PriceTrend::classify(value) {
        PriceTrend::Up => Style::default().fg(Color::Green),
        PriceTrend::Down => Style::default().fg(Color::Red),
        PriceTrend::Neutral => Style::default().fg(Color::Gray),
    }
}

fn status_style(status: &str) -> Style {
    match TradeStatusClass::classify(status) {
        TradeStatusClass::Trading => Style::default().fg(Color::Green),
        TradeStatusClass::Halted => Style::default().fg(Color::Red),
        TradeStatusClass::Neutral => Style::default().fg(Color::Gray),
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, vertical, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, horizontal, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(vertical);
    horizontal
}

fn clamp_selection(visible_len: usize, table_state: &mut TableState) {
    if visible_len == 0 {
        table_state.select(None);
        return;
    }
    let selected = table_state.selected().unwrap_or(0);
    let clamped = selected.min(visible_len.saturating_sub(1));
    table_state.select(Some(clamped));
}

fn select_prev(visible_len: usize, table_state: &mut TableState) {
    if visible_len == 0 {
        table_state.select(None);
        return;
    }
    let next = table_state.selected().unwrap_or(0).saturating_sub(1);
    table_state.select(Some(next));
}

fn select_next(visible_len: usize, table_state: &mut TableState) {
    if visible_len == 0 {
        table_state.select(None);
        return;
    }
    let current = table_state.selected().unwrap_or(0);
    let max_index = visible_len.saturating_sub(1);
    table_state.select(Some((current + 1).min(max_index)));
}

fn enter_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn leave_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
