//! View rendering
//!
//! [`render`] maps a [`LoadState`] to a [`View`]; [`View::to_html`] turns
//! that into the markup the page container expects.

use crate::constants::*;
use crate::format::{country_code, escape_html, format_amount, truncate_text};
use crate::settings::Translations;
use crate::types::{Investment, LoadState};
use std::fmt::Write;

/// Presentation knobs shared by every view
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub translations: Translations,
    pub skeleton_count: usize,
    pub stagger_delay_ms: u64,
    pub description_limit: usize,
    /// Prefix for site-relative assets such as the premium badge icon
    pub site_origin: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            translations: Translations::default(),
            skeleton_count: DEFAULT_SKELETON_COUNT,
            stagger_delay_ms: DEFAULT_STAGGER_DELAY_MS,
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            site_origin: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Which UI state is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Idle,
    Loading,
    Retrying,
    Error,
    Empty,
    Success,
}

/// One formatted investment card. Text is raw here; escaping happens in `to_html`.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub image: String,
    pub country_code: String,
    pub country_name: String,
    pub is_premium: bool,
    pub description: String,
    pub expected_roi: String,
    pub minimum: String,
    pub maximum: String,
    pub timeline: String,
    pub categories: Vec<String>,
    pub url: String,
    pub animation_delay_ms: u64,
}

impl Card {
    pub fn from_investment(investment: &Investment, index: usize, options: &RenderOptions) -> Self {
        Self {
            id: investment.id.clone().unwrap_or_default(),
            name: investment.name.clone(),
            image: investment.image.clone().unwrap_or_default(),
            country_code: country_code(investment.country.as_deref()),
            country_name: investment
                .country_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            is_premium: investment.is_premium,
            description: truncate_text(
                investment.description.as_deref().unwrap_or_default(),
                options.description_limit,
            ),
            expected_roi: investment.expected_roi.clone().unwrap_or_default(),
            minimum: format_amount(investment.minimum_investment),
            maximum: format_amount(investment.maximum_investment),
            timeline: investment.investment_timeline.clone().unwrap_or_default(),
            categories: investment
                .categories
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            url: investment.url.clone().unwrap_or_default(),
            animation_delay_ms: index as u64 * options.stagger_delay_ms,
        }
    }
}

/// What the container should show
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Blank,
    Skeleton { count: usize },
    RetryNotice { attempt: u32, max_attempts: u32 },
    Failure,
    Empty,
    Cards(Vec<Card>),
}

pub fn render(state: &LoadState, options: &RenderOptions) -> View {
    match state {
        LoadState::Idle => View::Blank,
        LoadState::Loading { attempt: 0, .. } => View::Skeleton {
            count: options.skeleton_count,
        },
        // The retry notice stays up while the retried request is in flight
        LoadState::Loading {
            attempt,
            max_attempts,
        }
        | LoadState::Retrying {
            attempt,
            max_attempts,
        } => View::RetryNotice {
            attempt: *attempt,
            max_attempts: *max_attempts,
        },
        LoadState::Error { .. } => View::Failure,
        LoadState::Success(items) if items.is_empty() => View::Empty,
        LoadState::Success(items) => View::Cards(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| Card::from_investment(item, index, options))
                .collect(),
        ),
    }
}

impl View {
    pub fn kind(&self) -> ViewKind {
        match self {
            View::Blank => ViewKind::Idle,
            View::Skeleton { .. } => ViewKind::Loading,
            View::RetryNotice { .. } => ViewKind::Retrying,
            View::Failure => ViewKind::Error,
            View::Empty => ViewKind::Empty,
            View::Cards(_) => ViewKind::Success,
        }
    }

    pub fn to_html(&self, options: &RenderOptions) -> String {
        match self {
            View::Blank => String::new(),
            View::Skeleton { count } => skeleton_html(*count),
            View::RetryNotice {
                attempt,
                max_attempts,
            } => retry_html(*attempt, *max_attempts),
            View::Failure => ERROR_HTML.to_string(),
            View::Empty => EMPTY_HTML.to_string(),
            View::Cards(cards) => cards.iter().map(|card| card_html(card, options)).collect(),
        }
    }
}

// ============================================================================
// MARKUP
// ============================================================================

fn card_html(card: &Card, options: &RenderOptions) -> String {
    let t = &options.translations;
    let name = escape_html(&card.name);
    let country_name = escape_html(&card.country_name);

    let categories: String = if card.categories.is_empty() {
        r#"<span class="cat_lable__">Uncategorized</span>"#.to_string()
    } else {
        card.categories
            .iter()
            .map(|c| format!(r#"<span class="cat_lable__">{}</span>"#, escape_html(c)))
            .collect()
    };

    let badge = if card.is_premium {
        format!(
            r#"<span class="badge__"><img width="16" height="16" src="{}/assets/front/images/shapes/sun.svg" alt="">Premium</span>"#,
            escape_html(options.site_origin.trim_end_matches('/'))
        )
    } else {
        String::new()
    };

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="testimonial_card__ investment-item-animated" style="animation-delay: {delay}ms; opacity: 0;" data-opportunity-id="{id}">"#,
        delay = card.animation_delay_ms,
        id = escape_html(&card.id),
    );
    let _ = write!(
        html,
        r#"<div class="head__"><div class="company_card__"><div class="image_wrapper__"><figure class="figure__ asp-om loading-omd company_figure__"><img class="img-om lazy-omd" src="{image}" data-src="{image}" alt="{name}"/></figure></div>"#,
        image = escape_html(&card.image),
        name = name,
    );
    let _ = write!(
        html,
        r#"<div class="compony_content__"><h3 class="title__">{name}</h3><div class="location_wrapper__"><figure class="figure__ flag__"><img class="img-om" src="{cdn}/{code}.svg" alt="{country}"></figure><span class="text__">{country}</span></div></div></div>{badge}</div>"#,
        name = name,
        cdn = FLAG_CDN_URL,
        code = escape_html(&card.country_code),
        country = country_name,
        badge = badge,
    );
    let _ = write!(
        html,
        r#"<p class="parag__">{}</p>"#,
        escape_html(&card.description)
    );
    html.push_str(r#"<div class="body__">"#);
    for (label, value) in [
        (&t.expected_roi, format!("{}%", escape_html(&card.expected_roi))),
        (&t.minimum_amount, escape_html(&card.minimum)),
        (&t.maximum_amount, escape_html(&card.maximum)),
        (
            &t.round_duration,
            format!("{} {}", escape_html(&card.timeline), escape_html(&t.months)),
        ),
    ] {
        let _ = write!(
            html,
            r#"<div class="info__"><span class="title__">{}</span><span class="value__">{}</span></div>"#,
            escape_html(label),
            value
        );
    }
    html.push_str("</div>");
    let _ = write!(
        html,
        r#"<div class="card_categories_wrapper__">{}</div>"#,
        categories
    );
    let _ = write!(
        html,
        r#"<div class="footer__"><a class="button__ testimonial_details_button__" href="{}">Details</a><button class="button__ primary_button__ testimonial_invest_button__"><i class="fas fa-hand-holding-usd me-2"></i>Invest Now</button></div></div>"#,
        escape_html(&card.url)
    );
    html
}

fn skeleton_html(count: usize) -> String {
    let mut html = String::new();
    for i in 0..count {
        let _ = write!(
            html,
            r#"<div class="testimonial_card__ shimmer-investment-item" style="animation-delay: {}ms;">{}</div>"#,
            i * 50,
            SKELETON_BODY
        );
    }
    html
}

fn retry_html(attempt: u32, max_attempts: u32) -> String {
    format!(
        r#"<div class="investment-retry-wrapper fade-in-up"><div class="investment-retry-content"><h4>Connection Issue</h4><p>Retrying automatically... Attempt {} of {}</p><div class="retry-spinner"><div class="spinner"></div></div></div></div>"#,
        attempt, max_attempts
    )
}

const SKELETON_BODY: &str = concat!(
    r#"<div class="head__"><div class="company_card__"><div class="image_wrapper__"><div class="shimmer-box shimmer-circle"></div></div>"#,
    r#"<div class="compony_content__"><div class="shimmer-box shimmer-title"></div><div class="location_wrapper__"><div class="shimmer-box shimmer-circle"></div><div class="shimmer-box shimmer-text"></div></div></div></div>"#,
    r#"<div class="shimmer-box shimmer-badge"></div></div>"#,
    r#"<div class="shimmer-box shimmer-text"></div><div class="shimmer-box shimmer-text"></div><div class="shimmer-box shimmer-text"></div>"#,
    r#"<div class="body__"><div class="info__"></div><div class="info__"></div><div class="info__"></div><div class="info__"></div></div>"#,
    r#"<div class="card_categories_wrapper__"><div class="shimmer-box shimmer-badge"></div></div>"#,
    r#"<div class="footer__"><div class="shimmer-box shimmer-button"></div><div class="shimmer-box shimmer-button"></div></div>"#,
);

const EMPTY_HTML: &str = concat!(
    r#"<div class="investment-empty-wrapper fade-in-up"><div class="investment-empty-content">"#,
    r#"<h4>No Investments Found</h4>"#,
    r#"<p>There are no investment opportunities available in this category at the moment.</p>"#,
    r#"<button class="button__ secondary_button__ view-all-investments-btn">View All Investments</button>"#,
    r#"</div></div>"#,
);

const ERROR_HTML: &str = concat!(
    r#"<div class="investment-error-wrapper fade-in-up"><div class="investment-error-content">"#,
    r#"<h4>Unable to Load Investments</h4>"#,
    r#"<p>We couldn't connect to the server. Please check your internet connection and try again.</p>"#,
    r#"<button class="button__ primary_button__ retry-button-investment-ajax">Try Again</button>"#,
    r#"</div></div>"#,
);
