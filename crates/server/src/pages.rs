//! Server-rendered HTML pages

use axum::response::Html;
use loandesk_core::calculator::{
    AMOUNT_STEP, MAX_AMOUNT, MAX_TERM, MIN_AMOUNT, MIN_TERM,
};
use loandesk_core::format::{
    format_amount, format_created_at, format_rubles, format_term, format_text,
};
use loandesk_core::{
    Application, ApplicationForm, LoanQuote, Notification, NotificationKind, Status, StatusCounts,
};

const COMPANY: &str = "Interest-Free Installments";

const STYLE: &str = r"
body { font-family: system-ui, sans-serif; margin: 0; background: #f7f7f9; color: #1f2430; }
header { background: #fff; border-bottom: 1px solid #e3e3e8; padding: 1rem 2rem; display: flex; justify-content: space-between; align-items: center; }
main { max-width: 1100px; margin: 0 auto; padding: 2rem; }
section { background: #fff; border: 1px solid #e3e3e8; border-radius: 8px; padding: 1.5rem; margin-bottom: 1.5rem; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: .5rem; border-bottom: 1px solid #eee; }
.num { text-align: right; white-space: nowrap; }
.toast { padding: .75rem 1rem; border-radius: 6px; margin-bottom: 1rem; }
.toast-success { background: #e6f6ea; }
.toast-error { background: #fdecea; }
.badge { padding: .1rem .5rem; border-radius: 999px; font-size: .85rem; background: #eceef3; }
.badge-new { background: #dbe7ff; }
.badge-processing { background: #fff3cd; }
.badge-approved { background: #d7f5df; }
.badge-rejected { background: #fadcd9; }
.counts { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; text-align: center; }
.counts strong { display: block; font-size: 2rem; }
label { display: block; margin-top: .75rem; }
";

/// Escape text for HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn layout(title: &str, header_link: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<header><div><strong>{COMPANY}</strong><br><small>Microfinance company</small></div>{header_link}</header>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    ))
}

fn notifications_html(notifications: &[Notification]) -> String {
    notifications
        .iter()
        .map(|n| {
            let class = match n.kind {
                NotificationKind::Success => "toast toast-success",
                NotificationKind::Error => "toast toast-error",
            };
            format!(
                r#"<div class="{class}" role="status"><strong>{}</strong> {}</div>"#,
                escape(&n.title),
                escape(&n.description)
            )
        })
        .collect()
}

/// Public landing page: calculator and application form
pub fn landing(quote: &LoanQuote, form: &ApplicationForm, notifications: &[Notification]) -> Html<String> {
    let body = format!(
        r#"{notifications}
<section id="calculator">
<h1>Loan calculator</h1>
<form method="get" action="/">
<label>Amount: <strong>{amount}</strong>
<input type="range" name="amount" min="{MIN_AMOUNT}" max="{MAX_AMOUNT}" step="{AMOUNT_STEP}" value="{amount_raw}"></label>
<label>Term: <strong>{term} mo.</strong>
<input type="range" name="term" min="{MIN_TERM}" max="{MAX_TERM}" step="1" value="{term_raw}"></label>
<button type="submit">Calculate</button>
</form>
<p>Monthly payment: <strong id="monthly-payment">{monthly}</strong></p>
<p>Interest rate: <strong>{rate}%</strong> &middot; Overpayment: <strong>{overpayment}</strong></p>
</section>
<section id="apply">
<h2>Loan application</h2>
<p>Fill in the form and we will contact you within 15 minutes.</p>
<form method="post" action="/apply">
<label>Full name <input name="full_name" required value="{full_name}"></label>
<label>Phone <input name="phone" type="tel" required value="{phone}"></label>
<label>Email <input name="email" type="email" required value="{email}"></label>
<label>Loan amount <input name="amount" type="number" value="{amount_value}"></label>
<label>Term (months) <input name="term" type="number" value="{term_value}"></label>
<label>Purpose <textarea name="purpose" rows="3">{purpose}</textarea></label>
<button type="submit">Send application</button>
</form>
</section>"#,
        notifications = notifications_html(notifications),
        amount = format_rubles(quote.amount),
        amount_raw = quote.amount,
        term = quote.term,
        term_raw = quote.term,
        monthly = format_rubles(quote.monthly_payment),
        rate = quote.rate_percent,
        overpayment = format_rubles(quote.overpayment),
        full_name = escape(&form.full_name),
        phone = escape(&form.phone),
        email = escape(&form.email),
        amount_value = escape(&form.amount),
        term_value = escape(&form.term),
        purpose = escape(&form.purpose),
    );

    layout(COMPANY, r#"<a href="/admin">Admin</a>"#, &body)
}

/// Admin page, signed-out variant
pub fn login(notifications: &[Notification]) -> Html<String> {
    let body = format!(
        r#"{}
<section>
<h1>Admin sign-in</h1>
<form method="post" action="/admin/login">
<label>Password <input name="password" type="password" autocomplete="current-password" required autofocus></label>
<button type="submit">Sign in</button>
</form>
</section>"#,
        notifications_html(notifications)
    );

    layout("Admin panel", r#"<a href="/">Home</a>"#, &body)
}

/// Snapshot of a console taken for rendering
pub struct ConsoleView<'a> {
    pub applications: &'a [Application],
    pub counts: StatusCounts,
    pub loading: bool,
    pub can_refresh: bool,
    pub notifications: &'a [Notification],
}

fn status_badge(status: &Status) -> String {
    let class = if status.is_known() {
        format!("badge badge-{}", status.as_str())
    } else {
        "badge".to_string()
    };
    let label = format_text(Some(status.label()));
    format!(r#"<span class="{class}">{}</span>"#, escape(label))
}

fn status_control(app: &Application) -> String {
    // An unknown status stays selected and cannot be submitted back
    let current = if app.status.is_known() {
        String::new()
    } else {
        format!(
            r#"<option value="{}" selected disabled>{}</option>"#,
            escape(app.status.as_str()),
            escape(format_text(Some(app.status.label())))
        )
    };
    let options: String = Status::KNOWN
        .iter()
        .map(|status| {
            let selected = if *status == app.status { " selected" } else { "" };
            format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                status.as_str(),
                status.label()
            )
        })
        .collect();

    format!(
        r#"<form method="post" action="/admin/applications/{id}/status"><select name="status">{current}{options}</select> <button type="submit">Save</button></form>"#,
        id = app.id
    )
}

fn application_row(app: &Application) -> String {
    let purpose = format_text(app.purpose.as_deref());
    format!(
        r#"<tr>
<td>#{id}</td>
<td>{name}</td>
<td><a href="tel:{phone}">{phone}</a></td>
<td><a href="mailto:{email}">{email}</a></td>
<td class="num">{amount}</td>
<td>{term}</td>
<td title="{purpose}">{purpose}</td>
<td>{badge}{control}</td>
<td>{created}</td>
</tr>"#,
        id = app.id,
        name = escape(&app.full_name),
        phone = escape(&app.phone),
        email = escape(&app.email),
        amount = format_amount(app.loan_amount),
        term = format_term(app.loan_term),
        purpose = escape(purpose),
        badge = status_badge(&app.status),
        control = status_control(app),
        created = escape(&format_created_at(&app.created_at)),
    )
}

/// Admin page, signed-in variant
pub fn console(view: &ConsoleView<'_>) -> Html<String> {
    let listing = if view.loading && view.applications.is_empty() {
        r#"<p class="empty">Loading applications...</p>"#.to_string()
    } else if view.applications.is_empty() {
        r#"<p class="empty">No applications yet</p>"#.to_string()
    } else {
        let rows: String = view.applications.iter().map(application_row).collect();
        format!(
            r"<table>
<thead><tr><th>ID</th><th>Full name</th><th>Phone</th><th>Email</th><th class='num'>Amount</th><th>Term</th><th>Purpose</th><th>Status</th><th>Date</th></tr></thead>
<tbody>
{rows}
</tbody>
</table>"
        )
    };

    let refresh_disabled = if view.can_refresh { "" } else { " disabled" };
    let counts = &view.counts;

    let body = format!(
        r#"{notifications}
<section>
<h1>Loan applications</h1>
<p>Total applications: <strong id="total">{total}</strong></p>
<form method="post" action="/admin/refresh" style="display:inline"><button type="submit"{refresh_disabled}>Refresh</button></form>
<form method="post" action="/admin/logout" style="display:inline"><button type="submit">Log out</button></form>
</section>
<section>
<h2>Application list</h2>
<p>Newest applications first</p>
{listing}
</section>
<section class="counts">
<div><strong id="count-new">{new}</strong>New</div>
<div><strong id="count-processing">{processing}</strong>Processing</div>
<div><strong id="count-approved">{approved}</strong>Approved</div>
<div><strong id="count-rejected">{rejected}</strong>Rejected</div>
</section>"#,
        notifications = notifications_html(view.notifications),
        total = view.applications.len(),
        new = counts.new,
        processing = counts.processing,
        approved = counts.approved,
        rejected = counts.rejected,
    );

    layout("Admin panel", r#"<a href="/">Home</a>"#, &body)
}
