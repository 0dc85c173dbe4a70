//! Page projections.
//!
//! Every render starts from the store's view of the current user plus
//! the built-in catalogs and returns the page as text. No I/O happens
//! here; the CLI decides when to print.

use std::collections::HashSet;
use std::fmt::Write;

use crate::catalog::{self, MENUS, REWARDS, ROOMS};
use crate::session::{Booking, Ticket, UserProfile};

/// Header affordance: greeting + balance when signed in, a sign-in
/// hint otherwise.
pub fn header(user: Option<&UserProfile>) -> String {
    match user {
        Some(u) => format!(
            "Mmakwany Guest House | {} . {} pts",
            u.first_name(),
            u.loyalty_points
        ),
        None => "Mmakwany Guest House | Sign in with: login [email] [name]".to_string(),
    }
}

pub fn home(user: Option<&UserProfile>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(user));
    let _ = writeln!(out);
    let _ = writeln!(out, "Karibu! Rooms, catering, and rewards in one place.");
    let _ = writeln!(out, "Pages: rooms, shop, dashboard. Type 'help' for commands.");
    out
}

pub fn login_page(user: Option<&UserProfile>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(user));
    let _ = writeln!(out);
    match user {
        Some(u) => {
            let _ = writeln!(out, "Already signed in as {} ({}).", u.display_name, u.email);
            let _ = writeln!(out, "Use 'logout' to switch accounts.");
        }
        None => {
            let _ = writeln!(out, "Sign in: login [email] [name]");
            let _ = writeln!(out, "Leaving the fields out signs you in as the default guest.");
        }
    }
    out
}

pub fn rooms(user: Option<&UserProfile>, currency: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(user));
    let _ = writeln!(out);
    let _ = writeln!(out, "Rooms and Suites");
    for (i, room) in ROOMS.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} [{}] {}/night",
            i + 1,
            room.name,
            room.badge,
            catalog::format_money(currency, u64::from(room.nightly_rate)),
        );
        let _ = writeln!(out, "     {}", room.blurb);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Book with: book <number>");
    out
}

pub fn shop(user: Option<&UserProfile>, redeemed: &HashSet<String>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(user));
    let _ = writeln!(out);
    let _ = writeln!(out, "Rewards Shop");
    for (i, reward) in REWARDS.iter().enumerate() {
        let marker = reward_marker(user, redeemed, reward.name, reward.cost);
        let _ = writeln!(
            out,
            "  {}. {} ({}) {}",
            i + 1,
            reward.name,
            reward.category.as_str(),
            marker,
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Redeem with: redeem <number>");
    out
}

fn reward_marker(
    user: Option<&UserProfile>,
    redeemed: &HashSet<String>,
    name: &str,
    cost: u32,
) -> String {
    if redeemed.contains(name) {
        return "[redeemed]".to_string();
    }
    match user {
        Some(u) if u.loyalty_points < cost => {
            format!("[{} pts, needs {} more]", cost, cost - u.loyalty_points)
        }
        _ => format!("[{} pts]", cost),
    }
}

pub fn dashboard(
    user: Option<&UserProfile>,
    selected_menu: Option<&str>,
    guest_count: u32,
    currency: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(user));
    let _ = writeln!(out);

    let Some(u) = user else {
        let _ = writeln!(out, "Sign in to see your dashboard: login [email] [name]");
        return out;
    };

    let _ = writeln!(out, "Guest Dashboard");
    let _ = writeln!(out, "  {} <{}>", u.display_name, u.email);
    if let Some(phone) = &u.phone {
        let _ = writeln!(out, "  Phone: {}", phone);
    }
    let _ = writeln!(out, "  Member since: {}", u.member_since.format("%Y-%m-%d"));
    let _ = writeln!(out, "  Loyalty points: {}", u.loyalty_points);

    let _ = writeln!(out);
    if u.bookings.is_empty() {
        let _ = writeln!(out, "No bookings yet. Browse 'rooms' to make one.");
    } else {
        let _ = writeln!(out, "Bookings:");
        let _ = write!(out, "{}", bookings_table(&u.bookings));
    }

    if !u.tickets.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Event passes:");
        let _ = write!(out, "{}", tickets_table(&u.tickets));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Catering menus (select with: menu <number>):");
    for (i, menu) in MENUS.iter().enumerate() {
        let mark = if selected_menu == Some(menu.name) { "*" } else { " " };
        let _ = writeln!(
            out,
            " {} {}. {} ({}) {}/head",
            mark,
            i + 1,
            menu.name,
            menu.category,
            catalog::format_money(currency, u64::from(menu.price_per_head)),
        );
    }
    if let Some(name) = selected_menu {
        if let Some(price) = catalog::menu_price(name) {
            let total = u64::from(price) * u64::from(guest_count);
            let _ = writeln!(out);
            let _ = writeln!(out, "Selected menu: {}", name);
            let _ = writeln!(
                out,
                "  {}/head x {} guests = {}",
                catalog::format_money(currency, u64::from(price)),
                guest_count,
                catalog::format_money(currency, total),
            );
            let _ = writeln!(out, "  Confirm with: confirm");
        }
    }
    out
}

pub fn bookings_table(bookings: &[Booking]) -> String {
    let mut out = String::new();
    for b in bookings {
        let _ = writeln!(
            out,
            "  {}  {}  {}  {}  {}",
            b.id,
            b.kind,
            b.label,
            b.price,
            b.created_at.format("%Y-%m-%d"),
        );
    }
    out
}

pub fn tickets_table(tickets: &[Ticket]) -> String {
    let mut out = String::new();
    for t in tickets {
        let label = t
            .fields
            .get("event")
            .and_then(|v| v.as_str())
            .unwrap_or("event pass");
        let _ = writeln!(out, "  {}  {}", t.id, label);
    }
    out
}
