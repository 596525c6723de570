//! Server-rendered HTML for the pages.
//!
//! Markup is assembled with `format!`; every interpolated value that did not
//! originate in this module goes through [`escape`].

use crate::forms::{AuthFormInput, FieldError, FormType};
use axum::response::Html;
use chrono::{DateTime, Utc};
use hirelyze_types::{Feedback, Interview, User};
use hirelyze_voice::{AgentMode, AgentProps, AgentSettings, CallTarget};
use serde::Serialize;
use std::fmt::Write as _;

const BRAND: &str = "HireLyze";

const INTERVIEW_COVERS: &[&str] = &[
    "/covers/adobe.png",
    "/covers/amazon.png",
    "/covers/facebook.png",
    "/covers/hostinger.png",
    "/covers/pinterest.png",
    "/covers/quora.png",
    "/covers/reddit.png",
    "/covers/skype.png",
    "/covers/spotify.png",
    "/covers/telegram.png",
    "/covers/tiktok.png",
    "/covers/yahoo.png",
];

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// A one-shot message shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    /// Toast for a `?notice=` key carried across a redirect.
    pub fn from_notice(notice: &str) -> Option<Self> {
        match notice {
            "account-created" => Some(Self::success(
                "Account created successfully! Please sign in.",
            )),
            "signed-in" => Some(Self::success("Signed in successfully!")),
            "signed-out" => Some(Self::success("Signed out successfully.")),
            _ => None,
        }
    }

    fn render(&self) -> String {
        let class = match self.kind {
            ToastKind::Success => "toast toast-success",
            ToastKind::Error => "toast toast-error",
        };
        format!(
            r#"<div class="{class}" role="status">{}</div>"#,
            escape(&self.message)
        )
    }
}

fn document(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {BRAND}</title>
<link rel="stylesheet" href="/styles.css">
</head>
<body class="dark">
{body}
</body>
</html>
"#,
        title = escape(title),
    ))
}

/// The signed-in area's shell: brand navigation above the page content.
fn root_layout(title: &str, content: &str) -> Html<String> {
    let body = format!(
        r#"<div class="root-layout">
<nav><a href="/" class="brand"><img src="/logo.png" alt="Logo" width="38" height="32"><h2>{BRAND}</h2></a></nav>
{content}
</div>"#
    );
    document(title, &body)
}

/// Deterministic cover image for an interview.
pub fn cover_image(interview_id: &str) -> &'static str {
    let sum: usize = interview_id.bytes().map(usize::from).sum();
    INTERVIEW_COVERS[sum % INTERVIEW_COVERS.len()]
}

/// Formats a stored timestamp as `MMM D, YYYY`.
pub fn format_date(timestamp: &str) -> Option<String> {
    parse_timestamp(timestamp).map(|t| t.format("%b %-d, %Y").to_string())
}

/// Formats a stored timestamp as `MMM D, YYYY h:mm A`.
pub fn format_date_time(timestamp: &str) -> Option<String> {
    parse_timestamp(timestamp).map(|t| t.format("%b %-d, %Y %-I:%M %p").to_string())
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Colour band for a score out of 100.
pub fn score_class(score: u32) -> &'static str {
    if score >= 80 {
        "score-high"
    } else if score >= 60 {
        "score-medium"
    } else {
        "score-low"
    }
}

fn tech_badges(techstack: &[String]) -> String {
    let mut out = String::from(r#"<ul class="tech-icons">"#);
    for tech in techstack {
        let _ = write!(out, r#"<li class="tech-badge">{}</li>"#, escape(tech));
    }
    out.push_str("</ul>");
    out
}

// ---------------------------------------------------------------------------
// Auth forms
// ---------------------------------------------------------------------------

fn field(
    name: &str,
    label: &str,
    kind: &str,
    placeholder: &str,
    value: &str,
    errors: &[FieldError],
) -> String {
    let error = errors
        .iter()
        .find(|e| e.field == name)
        .map(|e| format!(r#"<p class="form-error">{}</p>"#, escape(e.message)))
        .unwrap_or_default();
    format!(
        r#"<label class="label" for="{name}">{label}</label>
<input class="input" id="{name}" name="{name}" type="{kind}" placeholder="{placeholder}" value="{value}">
{error}"#,
        value = escape(value),
    )
}

/// The sign-in or sign-up page. The password is never echoed back.
pub fn auth_page(
    form: FormType,
    input: &AuthFormInput,
    errors: &[FieldError],
    toast: Option<&Toast>,
) -> Html<String> {
    let mut fields = String::new();
    if form == FormType::SignUp {
        fields.push_str(&field("name", "Name", "text", "Your Name", &input.name, errors));
    }
    fields.push_str(&field(
        "email",
        "Email",
        "email",
        "Your email address",
        &input.email,
        errors,
    ));
    fields.push_str(&field("password", "Password", "password", "Enter your password", "", errors));

    let switch = match form {
        FormType::SignIn => r#"No Account yet? <a href="/sign-up">Sign Up</a>"#,
        FormType::SignUp => r#"Have an account already? <a href="/sign-in">Sign In</a>"#,
    };
    let title = match form {
        FormType::SignIn => "Sign In",
        FormType::SignUp => "Sign Up",
    };

    let body = format!(
        r#"<div class="auth-layout">
{toast}
<div class="card-border"><div class="card">
<div class="brand"><img src="/logo.png" alt="logo" width="38" height="32"><h2>{BRAND}</h2></div>
<h3>Practice. Perfect. Perform — with AI by Your Side.</h3>
<form class="form" method="post" action="{action}">
{fields}
<button class="btn" type="submit">{submit}</button>
</form>
<p class="text-center">{switch}</p>
</div></div>
</div>"#,
        toast = toast.map(Toast::render).unwrap_or_default(),
        action = form.action(),
        submit = form.submit_label(),
    );
    document(title, &body)
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

/// An interview plus the viewer's feedback for it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub interview: Interview,
    pub feedback: Option<Feedback>,
}

/// One interview card.
pub fn interview_card(card: &CardView) -> String {
    let interview = &card.interview;
    let feedback = card.feedback.as_ref();

    let date = feedback
        .and_then(|f| format_date(&f.created_at))
        .or_else(|| format_date(&interview.created_at))
        .unwrap_or_else(|| Utc::now().format("%b %-d, %Y").to_string());
    let score = feedback
        .map(|f| f.total_score)
        .filter(|s| *s > 0)
        .map_or_else(|| "---".to_string(), |s| s.to_string());
    let assessment = feedback
        .map(|f| f.final_assessment.as_str())
        .filter(|a| !a.is_empty())
        .unwrap_or("You haven't taken the interview yet. Take it now to improve your skills");
    let (href, label) = match feedback {
        Some(_) => (format!("/interview/{}/feedback", interview.id), "Check Feedback"),
        None => (format!("/interview/{}", interview.id), "Take Interview"),
    };

    format!(
        r#"<div class="card-border card-interview">
<div class="badge"><p class="badge-text">{kind}</p></div>
<img src="{cover}" alt="Company Logo" width="90" height="90">
<h3 class="capitalize">{role} Interview</h3>
<div class="card-meta"><img src="/calendar.svg" alt="calendar" width="22" height="22"><p>{date}</p>
<img src="/star.svg" alt="star" width="22" height="22"><p>{score}/100</p></div>
<p class="line-clamp-2">{assessment}</p>
<div class="card-footer">{tech}<a class="btn-primary" href="{href}">{label}</a></div>
</div>"#,
        kind = escape(&interview.display_type()),
        cover = cover_image(&interview.id),
        role = escape(&interview.role),
        assessment = escape(assessment),
        tech = tech_badges(&interview.techstack),
        href = escape(&href),
    )
}

fn card_section(title: &str, cards: &[CardView], empty: &str) -> String {
    let content = if cards.is_empty() {
        format!("<p>{empty}</p>")
    } else {
        cards.iter().map(interview_card).collect::<Vec<_>>().join("\n")
    };
    format!(
        r#"<section class="interviews">
<h2>{title}</h2>
<div class="interviews-section">
{content}
</div>
</section>"#
    )
}

/// The dashboard.
pub fn home_page(
    user: &User,
    own: &[CardView],
    latest: &[CardView],
    toast: Option<&Toast>,
) -> Html<String> {
    let content = format!(
        r#"{toast}
<div class="welcome">
<div><h1>Welcome back, {name}!</h1><p class="text-muted">{email}</p></div>
<form method="post" action="/sign-out"><button class="btn-secondary" type="submit">Sign Out</button></form>
</div>
<section class="card-cta">
<div>
<h2>Get Hired Faster with AI-Powered Mock Interviews</h2>
<p>Practise on real interview questions and get instant feedback</p>
<a class="btn-primary" href="/interview">Start an Interview</a>
</div>
<img src="/robot.png" alt="Robot" width="400" height="400">
</section>
{own}
{latest}"#,
        toast = toast.map(Toast::render).unwrap_or_default(),
        name = escape(&user.name),
        email = escape(&user.email),
        own = card_section(
            "Your Interviews",
            own,
            "You have not taken any interviews yet."
        ),
        latest = card_section(
            "Take an Interview",
            latest,
            "There are no new interviews available."
        ),
    );
    root_layout("Dashboard", &content)
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Client bootstrap for the voice agent, embedded as JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentBootstrap<'a> {
    props: &'a AgentProps,
    call_target: CallTarget,
    web_token: &'a str,
}

/// The call view: interviewer and user tiles, transcript strip and the call
/// button, with the agent configuration for the client script.
pub fn agent_panel(props: &AgentProps, settings: &AgentSettings, web_token: &str) -> String {
    let bootstrap = AgentBootstrap {
        props,
        call_target: props.call_target(settings),
        web_token,
    };
    // `</` would end the script element early.
    let config = serde_json::to_string(&bootstrap)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode agent config");
            "{}".to_string()
        })
        .replace("</", "<\\/");
    let mode = match props.mode {
        AgentMode::Generate => "generate",
        AgentMode::Interview { .. } => "interview",
    };

    format!(
        r#"<div class="agent" data-mode="{mode}" data-status="INACTIVE">
<div class="call-view">
<div class="card-interviewer"><div class="avatar"><img src="/logo.png" alt="vapi" width="95" height="54"><span class="animate-speak" hidden></span></div><h3>AI Interviewer</h3></div>
<div class="card-border"><div class="card-content"><img src="/user-avatar.png" alt="user avatar" width="120" height="120"><h3>{name}</h3></div></div>
</div>
<div class="transcript-border" hidden><div class="transcript"><p class="latest-message"></p></div></div>
<div class="call-controls">
<button class="btn-call" type="button" data-action="call"><span>Call</span></button>
<button class="btn-disconnect" type="button" data-action="disconnect" hidden>End Call</button>
</div>
<script type="application/json" id="agent-config">{config}</script>
<script src="/agent.js" defer></script>
</div>"#,
        name = escape(&props.user_name),
    )
}

/// `/interview`: talk to the generation workflow.
pub fn generate_page(agent: &str) -> Html<String> {
    let content = format!("<h3>Interview Generation</h3>\n{agent}");
    root_layout("Interview Generation", &content)
}

/// `/interview/{id}`: interview header plus the agent in interview mode.
pub fn interview_page(interview: &Interview, agent: &str) -> Html<String> {
    let content = format!(
        r#"<div class="interview-header">
<div class="interview-title"><img src="{cover}" alt="Interview Cover" width="40" height="40"><h3 class="capitalize">{role}</h3>{tech}</div>
<p class="interview-type capitalize">{kind}</p>
</div>
{agent}"#,
        cover = cover_image(&interview.id),
        role = escape(&interview.role),
        tech = tech_badges(&interview.techstack),
        kind = escape(&interview.interview_type),
    );
    root_layout(&format!("{} Interview", interview.role), &content)
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

fn bullet_card(title: &str, dot: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let list: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect();
    format!(r#"<div class="panel"><h3><span class="dot {dot}"></span>{title}</h3><ul>{list}</ul></div>"#)
}

/// `/interview/{id}/feedback`.
pub fn feedback_page(interview: &Interview, feedback: Option<&Feedback>) -> Html<String> {
    let total = feedback.map_or(0, |f| f.total_score);
    let date = feedback
        .and_then(|f| format_date_time(&f.created_at))
        .unwrap_or_else(|| "N/A".to_string());

    let mut sections = String::new();
    if let Some(feedback) = feedback {
        if !feedback.final_assessment.is_empty() {
            let _ = write!(
                sections,
                r#"<div class="panel"><h2><span class="dot dot-blue"></span>Summary Assessment</h2><p>{}</p></div>"#,
                escape(&feedback.final_assessment)
            );
        }
        if !feedback.category_scores.is_empty() {
            sections.push_str(r#"<div class="panel"><h2><span class="dot dot-purple"></span>Performance Breakdown</h2>"#);
            for category in &feedback.category_scores {
                let _ = write!(
                    sections,
                    r#"<div class="category"><h3>{name}</h3><span class="score {class}">{score}/100</span><p>{comment}</p></div>"#,
                    name = escape(&category.name),
                    class = score_class(category.score),
                    score = category.score,
                    comment = escape(&category.comment),
                );
            }
            sections.push_str("</div>");
        }
        let strengths = bullet_card("Strengths", "dot-green", &feedback.strengths);
        let improvements = bullet_card(
            "Areas for Improvement",
            "dot-orange",
            &feedback.areas_for_improvement,
        );
        if !strengths.is_empty() || !improvements.is_empty() {
            let _ = write!(sections, r#"<div class="grid-2">{strengths}{improvements}</div>"#);
        }
    }

    let content = format!(
        r#"<div class="feedback">
<div class="feedback-header">
<img src="/star.svg" width="32" height="32" alt="feedback">
<h1>Interview Feedback</h1>
<p><span class="capitalize">{role}</span> Position</p>
</div>
<div class="panel overview">
<div class="overall {class}"><p>Overall Score</p><p class="total-score">{total}/100</p></div>
<div class="date"><p>Interview Date</p><p>{date}</p></div>
</div>
{sections}
<div class="actions">
<a class="btn-secondary" href="/">Back to Dashboard</a>
<a class="btn-primary" href="/interview/{id}">Retake Interview</a>
</div>
</div>"#,
        role = escape(&interview.role),
        class = score_class(total),
        id = escape(&interview.id),
    );
    root_layout("Interview Feedback", &content)
}
