use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};
use tui_dispatch::{Component, EventContext, EventKind, HandlerResponse, RenderContext};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, SelectList, SelectListBehavior, SelectListProps, SelectListStyle,
    SelectionStyle, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
    StatusBarStyle,
};

use pokedex::action::Action;
use pokedex::state::{AppState, CatalogEntry, DetailTab, EvolutionStep, MoveSummary};

use crate::PokedexComponentId;

const BG_BASE: Color = Color::Rgb(12, 18, 28);
const BG_PANEL: Color = Color::Rgb(20, 32, 46);
const BG_PANEL_ALT: Color = Color::Rgb(26, 40, 58);
const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);
const ACCENT_RED: Color = Color::Rgb(222, 96, 96);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub struct PokedexUi {
    entry_list: SelectList,
    move_list: SelectList,
    status_bar: StatusBar,
}

impl PokedexUi {
    pub fn new() -> Self {
        Self {
            entry_list: SelectList::new(),
            move_list: SelectList::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        _render_ctx: RenderContext,
        event_ctx: &mut EventContext<PokedexComponentId>,
    ) {
        let base = Block::default().style(Style::default().bg(BG_BASE));
        frame.render_widget(base, area);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        render_header(frame, layout[0], state, event_ctx);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(36), Constraint::Percentage(64)])
            .split(layout[1]);
        render_list(frame, body[0], state, event_ctx, &mut self.entry_list);
        render_detail(frame, body[1], state, event_ctx, &mut self.move_list);
        render_footer(frame, layout[2], state, &mut self.status_bar);
    }

    pub fn handle_list_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_list_event(event, state, &mut self.entry_list)
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_search_event(event, state)
    }
}

pub fn handle_list_event(
    event: &EventKind,
    state: &AppState,
    entry_list: &mut SelectList,
) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::PageDown => vec![Action::SelectionPage(1)],
            crossterm::event::KeyCode::PageUp => vec![Action::SelectionPage(-1)],
            crossterm::event::KeyCode::Home | crossterm::event::KeyCode::Char('g') => {
                vec![Action::SelectionJumpTop]
            }
            crossterm::event::KeyCode::End | crossterm::event::KeyCode::Char('G') => {
                vec![Action::SelectionJumpBottom]
            }
            _ => {
                let items = list_items(state);
                let props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: state.selected_index.min(items.len().saturating_sub(1)),
                    is_focused: true,
                    style: entry_list_style(),
                    behavior: SelectListBehavior {
                        show_scrollbar: true,
                        wrap_navigation: false,
                    },
                    on_select: Action::EntrySelect,
                    render_item: &|item| item.clone(),
                };
                let actions: Vec<_> = entry_list.handle_event(event, props).into_iter().collect();
                return handler_response(actions);
            }
        },
        EventKind::Scroll { delta, .. } => vec![Action::SelectionMove((*delta * 3) as i16)],
        _ => vec![],
    };
    handler_response(actions)
}

pub fn handle_search_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Esc => vec![Action::SearchCancel],
            crossterm::event::KeyCode::Enter => vec![Action::SearchSubmit],
            crossterm::event::KeyCode::Backspace => vec![Action::SearchBackspace],
            crossterm::event::KeyCode::Char(ch) => vec![Action::SearchInput(ch)],
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<PokedexComponentId>,
) {
    if state.search.active {
        event_ctx.set_component_area(PokedexComponentId::Search, area);
    }
    let title_style = Style::default()
        .fg(ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);
    let search = if state.search.active {
        format!("/{}_", state.search.query)
    } else if state.search.query.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", state.search.query)
    };
    let header_text = Text::from(vec![Line::from(vec![
        Span::styled("CATALOG", title_style),
        Span::raw("  |  Loaded: "),
        Span::styled(
            state.loader.items.len().to_string(),
            Style::default().fg(ACCENT_GOLD),
        ),
        Span::raw("  |  Search: "),
        Span::styled(search, Style::default().fg(ACCENT_TEAL)),
    ])]);

    let border = if state.search.active { ACCENT_TEAL } else { TEXT_DIM };
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(border))
        .title("POKEDEX");
    let paragraph = Paragraph::new(header_text)
        .block(block)
        .style(Style::default().fg(TEXT_MAIN));
    frame.render_widget(paragraph, area);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<PokedexComponentId>,
    entry_list: &mut SelectList,
) {
    event_ctx.set_component_area(PokedexComponentId::CatalogList, area);
    let title = if state.search.is_searching() {
        "RESULTS"
    } else {
        "DEX"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(
            Style::default()
                .fg(ACCENT_TEAL)
                .add_modifier(Modifier::BOLD),
        );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let items = list_items(state);
    if items.is_empty() {
        frame.render_widget(
            Paragraph::new(empty_list_text(state))
                .style(Style::default().fg(TEXT_DIM))
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: state.selected_index.min(items.len().saturating_sub(1)),
        is_focused: !state.search.active,
        style: entry_list_style(),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: Action::EntrySelect,
        render_item: &|item| item.clone(),
    };
    entry_list.render(frame, inner, props);
}

fn render_detail(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<PokedexComponentId>,
    move_list: &mut SelectList,
) {
    event_ctx.set_component_area(PokedexComponentId::DetailTabs, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("DATA")
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(4)])
        .split(inner);

    let tabs = Tabs::new(DetailTab::ALL.iter().map(|tab| tab.label()).collect::<Vec<_>>())
        .select(state.detail_tab.index())
        .style(Style::default().fg(TEXT_DIM))
        .highlight_style(
            Style::default()
                .fg(ACCENT_TEAL)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, layout[0]);

    let Some(entry) = state.selected_entry() else {
        frame.render_widget(
            Paragraph::new("Select a Pokemon.").style(Style::default().fg(TEXT_DIM)),
            layout[1],
        );
        return;
    };
    match state.detail_tab {
        DetailTab::About => render_text(frame, layout[1], about_text(entry)),
        DetailTab::Stats => render_text(frame, layout[1], stats_text(entry)),
        DetailTab::Evolution => render_text(frame, layout[1], evolution_text(&entry.evolutions)),
        DetailTab::Moves => render_moves(frame, layout[1], entry, move_list),
    }
}

fn render_text(frame: &mut Frame, area: Rect, text: Text<'static>) {
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(TEXT_MAIN))
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_moves(frame: &mut Frame, area: Rect, entry: &CatalogEntry, move_list: &mut SelectList) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("MOVES {}/{}", entry.moves.len(), entry.total_moves))
        .style(Style::default().bg(BG_PANEL_ALT).fg(TEXT_MAIN));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let items: Vec<Line<'static>> = entry.moves.iter().map(move_line).collect();
    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("No moves.").style(Style::default().fg(TEXT_DIM)),
            inner,
        );
        return;
    }
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: 0,
        is_focused: false,
        style: detail_list_style(),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: |_| Action::Tick,
        render_item: &|item| item.clone(),
    };
    move_list.render(frame, inner, props);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = footer_status(state);
    let color = if state.loader.failure.is_some() || state.search.error.is_some() {
        ACCENT_RED
    } else {
        ACCENT_GOLD
    };
    let status_span = Span::styled(status.as_str(), Style::default().fg(color));
    let status_items = [StatusBarItem::span(status_span)];
    let (left_hints, center_hints) = status_hints(state);

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_TEAL)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::hints(&center_hints).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> (Vec<StatusBarHint<'static>>, Vec<StatusBarHint<'static>>) {
    if state.search.active {
        let left = vec![
            StatusBarHint::new("Enter", "Apply"),
            StatusBarHint::new("Esc", "Clear"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
        return (left, Vec::new());
    }

    let mut left = vec![
        StatusBarHint::new("j/k", "Move"),
        StatusBarHint::new("PgUp/PgDn", "Page"),
        StatusBarHint::new("h/l", "Tabs"),
    ];
    if state.loader.failure.is_some() {
        left.push(StatusBarHint::new("r", "Retry"));
    } else if state.loader.can_fetch() && !state.search.is_searching() {
        left.push(StatusBarHint::new("n", "More"));
    }
    let center = vec![
        StatusBarHint::new("/", "Search"),
        StatusBarHint::new("q", "Quit"),
    ];
    (left, center)
}

/// Footer status line. Loading beats errors; errors beat informational messages.
pub fn footer_status(state: &AppState) -> String {
    let spinner = SPINNER[(state.tick as usize) % SPINNER.len()];
    if state.search.loading {
        return format!("{spinner} Searching \"{}\"...", state.search.term);
    }
    if state.search.is_searching() {
        if let Some(error) = state.search.error.as_deref() {
            return format!("Search failed: {error}");
        }
        return match state.search.results.len() {
            0 => "No matches".to_string(),
            1 => "1 match".to_string(),
            n => format!("{n} matches"),
        };
    }
    if state.loader.is_loading() {
        return format!("{spinner} Loading more...");
    }
    if state.loader.failure.is_some() {
        return "End of results. Press r to retry".to_string();
    }
    if !state.loader.has_more {
        return "End of results".to_string();
    }
    state.message.clone().unwrap_or_default()
}

fn empty_list_text(state: &AppState) -> &'static str {
    if state.search.is_searching() {
        if state.search.loading {
            "Searching..."
        } else {
            "No matches."
        }
    } else if state.loader.is_loading() {
        "Loading..."
    } else {
        "Nothing loaded yet."
    }
}

fn list_items(state: &AppState) -> Vec<Line<'static>> {
    state
        .visible_entries()
        .iter()
        .map(|entry| Line::from(format!("#{:03} {}", entry.id, entry.name)))
        .collect()
}

fn about_text(entry: &CatalogEntry) -> Text<'static> {
    let mut tags = Vec::new();
    if entry.is_baby {
        tags.push("Baby");
    }
    if entry.is_legendary {
        tags.push("Legendary");
    }
    if entry.is_mythical {
        tags.push("Mythical");
    }
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}  #{:03}", entry.name.to_ascii_uppercase(), entry.id),
            Style::default()
                .fg(ACCENT_TEAL)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "Japanese: {} ({})",
            entry.japanese_name, entry.romaji_name
        )),
        Line::from(format!("Type: {}", entry.types.join(" / "))),
        Line::from(format!(
            "Height: {}  Weight: {}",
            format_height(entry.height),
            format_weight(entry.weight)
        )),
        Line::from(format!("Habitat: {}  Shape: {}", entry.habitat, entry.shape)),
        Line::from(format!("Egg groups: {}", entry.egg_groups)),
        Line::from(format!("Capture rate: {}", entry.capture_rate)),
        Line::from(format!("Varieties: {}", entry.varieties)),
        Line::from(format!("Found at: {}", or_dash(&entry.location))),
    ];
    if !tags.is_empty() {
        lines.push(Line::from(Span::styled(
            tags.join(" "),
            Style::default().fg(ACCENT_GOLD),
        )));
    }
    if !entry.description.is_empty() {
        lines.push(Line::from(" "));
        lines.push(Line::from(entry.description.clone()));
    }
    Text::from(lines)
}

fn stats_text(entry: &CatalogEntry) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = entry
        .stats
        .entries()
        .iter()
        .map(|(label, value)| Line::from(stat_line(label, *value)))
        .collect();
    lines.push(Line::from(Span::styled(
        format!("{:>8} {:>3}", "Total", entry.stats.total()),
        Style::default()
            .fg(ACCENT_GOLD)
            .add_modifier(Modifier::BOLD),
    )));
    Text::from(lines)
}

fn evolution_text(steps: &[EvolutionStep]) -> Text<'static> {
    if steps.is_empty() {
        return Text::from("No evolution data.");
    }
    Text::from(
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| Line::from(evolution_line(index, step)))
            .collect::<Vec<_>>(),
    )
}

fn stat_line(label: &str, value: Option<u16>) -> String {
    match value {
        Some(value) => {
            let bar_len = (value as usize / 10).clamp(1, 20);
            format!("{label:>8} {value:>3} {}", "#".repeat(bar_len))
        }
        None => format!("{label:>8}   -"),
    }
}

fn evolution_line(index: usize, step: &EvolutionStep) -> String {
    let mut condition = Vec::new();
    if let Some(level) = step.min_level {
        condition.push(format!("Lv {level}"));
    }
    if let Some(item) = step.item.as_deref() {
        condition.push(format!("use {item}"));
    }
    if condition.is_empty() {
        if let Some(trigger) = step.trigger_name.as_deref() {
            condition.push(trigger.to_string());
        }
    }
    if condition.is_empty() {
        format!("{:02} {}", index + 1, step.species_name)
    } else {
        format!(
            "{:02} {} ({})",
            index + 1,
            step.species_name,
            condition.join(", ")
        )
    }
}

fn move_line(summary: &MoveSummary) -> Line<'static> {
    let level = summary
        .level_learned_at
        .filter(|level| *level > 0)
        .map(|level| format!("Lv{level:>3}"))
        .unwrap_or_else(|| "   --".to_string());
    Line::from(format!(
        "{level} {:<18} PWR {:>3} PP {:>2} ACC {:>3}",
        summary.name,
        number_or_dash(summary.power),
        number_or_dash(summary.pp),
        number_or_dash(summary.accuracy)
    ))
}

fn number_or_dash(value: Option<u16>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

/// Decimetres to metres.
fn format_height(height: u16) -> String {
    format!("{:.1} m", height as f32 / 10.0)
}

/// Hectograms to kilograms.
fn format_weight(weight: u16) -> String {
    format!("{:.1} kg", weight as f32 / 10.0)
}

fn entry_list_style() -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: None,
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: Some(
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD),
            ),
            marker: None,
            disabled: false,
        },
        ..SelectListStyle::default()
    }
}

fn detail_list_style() -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL_ALT),
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: None,
            marker: None,
            disabled: true,
        },
        ..SelectListStyle::default()
    }
}
