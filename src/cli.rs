use crate::activity::ActivityLog;
use crate::catalog::{self, MENUS, REWARDS, ROOMS};
use crate::config::Config;
use crate::notify::{toast, Severity};
use crate::session::{BookingInput, ProfileUpdate, Redemption, SessionStore};
use crate::views;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::collections::HashSet;

/// The site's pages, as REPL destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Rooms,
    Shop,
    Dashboard,
    Login,
}

fn page_slug(page: Page) -> &'static str {
    match page {
        Page::Home => "home",
        Page::Rooms => "rooms",
        Page::Shop => "shop",
        Page::Dashboard => "dashboard",
        Page::Login => "login",
    }
}

pub struct Context<'a> {
    pub config: Config,
    pub store: &'a dyn SessionStore,
    pub activity: RefCell<ActivityLog>,
    pub page: RefCell<Page>,
    /// Rewards marked redeemed this run. View-local, like the original
    /// page state; it does not survive a restart.
    pub redeemed: RefCell<HashSet<String>>,
    pub selected_menu: RefCell<Option<&'static str>>,
}

pub fn run_once(ctx: &Context, command: &str) -> Result<()> {
    handle_command(ctx, command.trim())?;
    Ok(())
}

pub fn run_repl(ctx: &Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("mmakwany - type 'help' for commands, 'exit' to quit");
    render(ctx);

    loop {
        let prompt = format!("{}> ", page_slug(*ctx.page.borrow()));
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                match handle_command(ctx, line) {
                    Ok(true) => break,
                    Ok(false) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Dispatch one command line. Returns true when the REPL should exit.
pub fn handle_command(ctx: &Context, line: &str) -> Result<bool> {
    let parts: Vec<&str> = line.splitn(2, ' ').collect();
    let rest = if parts.len() > 1 { parts[1].trim() } else { "" };

    match parts[0] {
        "exit" | "quit" => return Ok(true),
        "help" => print_help(),
        "home" => goto(ctx, Page::Home),
        "rooms" => goto(ctx, Page::Rooms),
        "shop" => goto(ctx, Page::Shop),
        "dashboard" => goto(ctx, Page::Dashboard),
        "login" => cmd_login(ctx, rest)?,
        "logout" => cmd_logout(ctx)?,
        "book" => cmd_book(ctx, rest)?,
        "redeem" => cmd_redeem(ctx, rest)?,
        "menu" => cmd_menu(ctx, rest),
        "confirm" => cmd_confirm(ctx)?,
        "ticket" => cmd_ticket(ctx, rest)?,
        "profile" => cmd_profile(ctx, rest)?,
        "whoami" => cmd_whoami(ctx),
        "points" => cmd_points(ctx),
        "bookings" => cmd_bookings(ctx),
        "tickets" => cmd_tickets(ctx),
        _ => println!("Unknown command: {} (try 'help')", parts[0]),
    }
    Ok(false)
}

fn print_help() {
    println!("Pages:");
    println!("  home | rooms | shop | dashboard - open a page");
    println!("Account:");
    println!("  login [email] [name]            - sign in (defaults to the demo guest)");
    println!("  logout                          - sign out and return home");
    println!("  whoami                          - show the signed-in guest");
    println!("  profile set <field> <value>     - update name, email, phone, or avatar");
    println!("Stay:");
    println!("  book <n>                        - book a room by number");
    println!("  menu <n>                        - select a catering menu");
    println!("  confirm                         - confirm the selected catering menu");
    println!("  ticket <event>                  - add an event pass to your wallet");
    println!("Rewards:");
    println!("  redeem <n>                      - redeem a reward by number");
    println!("  points                          - show your balance");
    println!("Records:");
    println!("  bookings | tickets              - list what you have booked or claimed");
    println!("Other:");
    println!("  help                            - show commands");
    println!("  exit                            - quit");
}

fn goto(ctx: &Context, page: Page) {
    *ctx.page.borrow_mut() = page;
    render(ctx);
}

/// Render the current page from a single store read.
pub fn render(ctx: &Context) {
    let user = ctx.store.current_user();
    let page = *ctx.page.borrow();
    let text = match page {
        Page::Home => views::home(user.as_ref()),
        Page::Rooms => views::rooms(user.as_ref(), &ctx.config.currency),
        Page::Shop => views::shop(user.as_ref(), &ctx.redeemed.borrow()),
        Page::Dashboard => views::dashboard(
            user.as_ref(),
            *ctx.selected_menu.borrow(),
            ctx.config.catering_guest_count,
            &ctx.config.currency,
        ),
        Page::Login => views::login_page(user.as_ref()),
    };
    print!("{}", text);
}

/// Guard for actions that need a session. Sends the guest to the
/// login page when there is none, mirroring the original redirect.
fn signed_in_or_redirect(ctx: &Context, hint: &str) -> bool {
    if ctx.store.is_authenticated() {
        return true;
    }
    toast(hint, Severity::Warning);
    *ctx.page.borrow_mut() = Page::Login;
    render(ctx);
    false
}

fn log_activity<F>(ctx: &Context, f: F)
where
    F: FnOnce(&mut ActivityLog) -> Result<()>,
{
    if let Err(e) = f(&mut ctx.activity.borrow_mut()) {
        eprintln!("Warning: failed to record activity: {}", e);
    }
}

/// 1-based menu/room/reward number to a catalog index.
fn parse_index(arg: &str, len: usize) -> Option<usize> {
    let n: usize = arg.trim().parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

fn cmd_login(ctx: &Context, rest: &str) -> Result<()> {
    let mut fields = rest.splitn(2, ' ');
    let email = fields.next().map(str::trim).filter(|s| !s.is_empty());
    let name = fields.next().map(str::trim).filter(|s| !s.is_empty());

    let user = ctx.store.login(email, name)?;
    log_activity(ctx, |log| log.login(&user.email));
    toast("Welcome to Mmakwany Guest House!", Severity::Success);
    *ctx.page.borrow_mut() = Page::Home;
    render(ctx);
    Ok(())
}

fn cmd_logout(ctx: &Context) -> Result<()> {
    if !ctx.store.is_authenticated() {
        toast("You are not signed in", Severity::Info);
        return Ok(());
    }
    ctx.store.logout()?;
    log_activity(ctx, |log| log.logout());

    // View-local state dies with the session.
    ctx.redeemed.borrow_mut().clear();
    *ctx.selected_menu.borrow_mut() = None;

    toast("Logged out successfully", Severity::Success);
    *ctx.page.borrow_mut() = Page::Home;
    render(ctx);
    Ok(())
}

fn cmd_book(ctx: &Context, rest: &str) -> Result<()> {
    if !signed_in_or_redirect(ctx, "Please log in to book a room") {
        return Ok(());
    }
    let Some(room) = parse_index(rest, ROOMS.len()).map(|i| &ROOMS[i]) else {
        toast(
            &format!("No such room: '{}' (1-{})", rest, ROOMS.len()),
            Severity::Error,
        );
        return Ok(());
    };

    let price = catalog::format_money(&ctx.config.currency, u64::from(room.nightly_rate));
    ctx.store.append_booking(BookingInput {
        kind: "room".to_string(),
        label: room.name.to_string(),
        price: price.clone(),
    })?;
    log_activity(ctx, |log| log.booking_added("room", room.name, &price));

    toast(
        &format!("{} booked successfully!", room.name),
        Severity::Success,
    );
    *ctx.page.borrow_mut() = Page::Dashboard;
    render(ctx);
    Ok(())
}

fn cmd_redeem(ctx: &Context, rest: &str) -> Result<()> {
    if !signed_in_or_redirect(ctx, "Please log in to redeem rewards") {
        return Ok(());
    }
    let Some(reward) = parse_index(rest, REWARDS.len()).map(|i| &REWARDS[i]) else {
        toast(
            &format!("No such reward: '{}' (1-{})", rest, REWARDS.len()),
            Severity::Error,
        );
        return Ok(());
    };
    if ctx.redeemed.borrow().contains(reward.name) {
        toast(
            &format!("{} is already redeemed", reward.name),
            Severity::Info,
        );
        return Ok(());
    }

    match ctx.store.redeem_points(reward.cost)? {
        Redemption::Redeemed { remaining } => {
            ctx.redeemed.borrow_mut().insert(reward.name.to_string());
            log_activity(ctx, |log| {
                log.points_redeemed(reward.name, reward.cost, remaining)
            });
            toast(
                &format!("Redeemed: {} ({} pts deducted)", reward.name, reward.cost),
                Severity::Success,
            );
            *ctx.page.borrow_mut() = Page::Shop;
            render(ctx);
        }
        Redemption::InsufficientPoints { have } => {
            toast(
                &format!("Not enough points (need {}, have {})", reward.cost, have),
                Severity::Error,
            );
        }
        Redemption::NoSession => {
            toast("Please log in to redeem rewards", Severity::Warning);
            *ctx.page.borrow_mut() = Page::Login;
            render(ctx);
        }
    }
    Ok(())
}

fn cmd_menu(ctx: &Context, rest: &str) {
    let Some(menu) = parse_index(rest, MENUS.len()).map(|i| &MENUS[i]) else {
        toast(
            &format!("No such menu: '{}' (1-{})", rest, MENUS.len()),
            Severity::Error,
        );
        return;
    };

    *ctx.selected_menu.borrow_mut() = Some(menu.name);
    let total =
        u64::from(menu.price_per_head) * u64::from(ctx.config.catering_guest_count);
    toast(
        &format!(
            "{} selected, {} total",
            menu.name,
            catalog::format_money(&ctx.config.currency, total)
        ),
        Severity::Success,
    );
    *ctx.page.borrow_mut() = Page::Dashboard;
    render(ctx);
}

fn cmd_confirm(ctx: &Context) -> Result<()> {
    let Some(name) = *ctx.selected_menu.borrow() else {
        toast("Select a menu first: menu <number>", Severity::Warning);
        return Ok(());
    };
    if !signed_in_or_redirect(ctx, "Please log in to confirm catering") {
        return Ok(());
    }
    let Some(price) = catalog::menu_price(name) else {
        toast(&format!("Unknown menu: {}", name), Severity::Error);
        return Ok(());
    };

    let guests = ctx.config.catering_guest_count;
    let total = catalog::format_money(&ctx.config.currency, u64::from(price) * u64::from(guests));
    let label = format!("{} for {} guests", name, guests);
    ctx.store.append_booking(BookingInput {
        kind: "catering".to_string(),
        label: label.clone(),
        price: total.clone(),
    })?;
    log_activity(ctx, |log| log.booking_added("catering", &label, &total));

    toast(
        &format!("Catering order confirmed! {} for {} guests.", name, guests),
        Severity::Success,
    );
    render(ctx);
    Ok(())
}

fn cmd_ticket(ctx: &Context, rest: &str) -> Result<()> {
    if !signed_in_or_redirect(ctx, "Please log in to claim event passes") {
        return Ok(());
    }
    if rest.is_empty() {
        toast("Usage: ticket <event name>", Severity::Warning);
        return Ok(());
    }

    let mut fields = serde_json::Map::new();
    fields.insert("event".to_string(), rest.into());
    fields.insert("kind".to_string(), "event-pass".into());
    ctx.store.append_ticket(fields)?;
    log_activity(ctx, |log| log.ticket_added(rest));

    toast("Event pass added to your wallet!", Severity::Success);
    Ok(())
}

fn cmd_profile(ctx: &Context, rest: &str) -> Result<()> {
    if rest.is_empty() {
        cmd_whoami(ctx);
        return Ok(());
    }

    let parts: Vec<&str> = rest.splitn(3, ' ').collect();
    let ["set", field, value] = parts.as_slice() else {
        toast(
            "Usage: profile set <name|email|phone|avatar> <value>",
            Severity::Warning,
        );
        return Ok(());
    };

    let mut update = ProfileUpdate::default();
    match *field {
        "name" => update.display_name = Some(value.to_string()),
        "email" => update.email = Some(value.to_string()),
        "phone" => update.phone = Some(value.to_string()),
        "avatar" => update.avatar = Some(value.to_string()),
        _ => {
            toast(
                &format!("Unknown field: {} (name, email, phone, avatar)", field),
                Severity::Error,
            );
            return Ok(());
        }
    }

    match ctx.store.update_user(update)? {
        Some(_) => {
            log_activity(ctx, |log| log.profile_updated(field));
            toast("Profile updated", Severity::Success);
        }
        None => {
            toast("Please log in to edit your profile", Severity::Warning);
            *ctx.page.borrow_mut() = Page::Login;
            render(ctx);
        }
    }
    Ok(())
}

fn cmd_whoami(ctx: &Context) {
    match ctx.store.current_user() {
        Some(u) => {
            println!("{} <{}>", u.display_name, u.email);
            if let Some(phone) = &u.phone {
                println!("Phone: {}", phone);
            }
            if let Some(avatar) = &u.avatar {
                println!("Avatar: {}", avatar);
            }
            println!("Member since: {}", u.member_since.format("%Y-%m-%d"));
            println!("Points: {}", u.loyalty_points);
        }
        None => println!("Not signed in"),
    }
}

fn cmd_points(ctx: &Context) {
    match ctx.store.current_user() {
        Some(u) => println!("{} pts", u.loyalty_points),
        None => println!("Not signed in"),
    }
}

fn cmd_bookings(ctx: &Context) {
    match ctx.store.current_user() {
        Some(u) if u.bookings.is_empty() => println!("No bookings yet"),
        Some(u) => print!("{}", views::bookings_table(&u.bookings)),
        None => println!("Not signed in"),
    }
}

fn cmd_tickets(ctx: &Context) {
    match ctx.store.current_user() {
        Some(u) if u.tickets.is_empty() => println!("No event passes yet"),
        Some(u) => print!("{}", views::tickets_table(&u.tickets)),
        None => println!("Not signed in"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{JsonFileStore, SessionDefaults};
    use std::path::Path;
    use tempfile::tempdir;

    fn context<'a>(store: &'a JsonFileStore, dir: &Path) -> Context<'a> {
        Context {
            config: Config::default(),
            store,
            activity: RefCell::new(ActivityLog::new(dir).unwrap()),
            page: RefCell::new(Page::Home),
            redeemed: RefCell::new(HashSet::new()),
            selected_menu: RefCell::new(None),
        }
    }

    #[test]
    fn test_login_then_book_persists_booking() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());

        handle_command(&ctx, "login amina@x.co.ke Amina Otieno").unwrap();
        handle_command(&ctx, "book 1").unwrap();

        let user = store.current_user().unwrap();
        assert_eq!(user.email, "amina@x.co.ke");
        assert_eq!(user.display_name, "Amina Otieno");
        assert_eq!(user.bookings.len(), 1);
        assert_eq!(user.bookings[0].kind, "room");
        assert_eq!(user.bookings[0].label, "Deluxe Room");
        assert_eq!(user.bookings[0].price, "KES 15,000");
        assert_eq!(*ctx.page.borrow(), Page::Dashboard);
    }

    #[test]
    fn test_book_without_session_redirects_to_login() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());

        handle_command(&ctx, "book 1").unwrap();

        assert!(store.current_user().is_none());
        assert_eq!(*ctx.page.borrow(), Page::Login);
    }

    #[test]
    fn test_redeem_flow() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());
        handle_command(&ctx, "login").unwrap();

        // Dinner for Two, 500 pts.
        handle_command(&ctx, "redeem 3").unwrap();
        assert_eq!(store.current_user().unwrap().loyalty_points, 1950);
        assert!(ctx.redeemed.borrow().contains("Dinner for Two"));

        // Redeeming the same reward again changes nothing.
        handle_command(&ctx, "redeem 3").unwrap();
        assert_eq!(store.current_user().unwrap().loyalty_points, 1950);

        // Sunset City Tour, 1200 pts.
        handle_command(&ctx, "redeem 7").unwrap();
        assert_eq!(store.current_user().unwrap().loyalty_points, 750);

        // Spa Morning costs 900; the balance stays put.
        handle_command(&ctx, "redeem 6").unwrap();
        assert_eq!(store.current_user().unwrap().loyalty_points, 750);
        assert!(!ctx.redeemed.borrow().contains("Spa Morning"));
    }

    #[test]
    fn test_menu_confirm_appends_catering_booking() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());
        handle_command(&ctx, "login").unwrap();

        handle_command(&ctx, "menu 4").unwrap();
        assert_eq!(*ctx.selected_menu.borrow(), Some("Swahili Coastal Buffet"));

        handle_command(&ctx, "confirm").unwrap();
        let user = store.current_user().unwrap();
        assert_eq!(user.bookings.len(), 1);
        assert_eq!(user.bookings[0].kind, "catering");
        assert_eq!(
            user.bookings[0].label,
            "Swahili Coastal Buffet for 200 guests"
        );
        assert_eq!(user.bookings[0].price, "KES 900,000");
    }

    #[test]
    fn test_confirm_without_selection_warns() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());
        handle_command(&ctx, "login").unwrap();

        handle_command(&ctx, "confirm").unwrap();
        assert!(store.current_user().unwrap().bookings.is_empty());
    }

    #[test]
    fn test_profile_set_updates_field() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());
        handle_command(&ctx, "login").unwrap();

        handle_command(&ctx, "profile set phone +254 700 111 222").unwrap();
        handle_command(&ctx, "profile set name Amina").unwrap();
        let user = store.current_user().unwrap();
        assert_eq!(user.phone.as_deref(), Some("+254 700 111 222"));
        assert_eq!(user.display_name, "Amina");

        // Unknown fields change nothing.
        handle_command(&ctx, "profile set nickname Ami").unwrap();
        let user = store.current_user().unwrap();
        assert_eq!(user.display_name, "Amina");
    }

    #[test]
    fn test_ticket_command() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());
        handle_command(&ctx, "login").unwrap();

        handle_command(&ctx, "ticket Jazz Night").unwrap();
        let user = store.current_user().unwrap();
        assert_eq!(user.tickets.len(), 1);
        assert_eq!(user.tickets[0].fields["event"], "Jazz Night");
        assert_eq!(user.tickets[0].fields["kind"], "event-pass");
    }

    #[test]
    fn test_logout_clears_view_state() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());
        handle_command(&ctx, "login").unwrap();
        handle_command(&ctx, "redeem 2").unwrap();
        handle_command(&ctx, "menu 1").unwrap();

        handle_command(&ctx, "logout").unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(*ctx.page.borrow(), Page::Home);
        assert!(ctx.redeemed.borrow().is_empty());
        assert!(ctx.selected_menu.borrow().is_none());
    }

    #[test]
    fn test_exit_returns_true() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), SessionDefaults::default());
        let ctx = context(&store, dir.path());

        assert!(handle_command(&ctx, "exit").unwrap());
        assert!(handle_command(&ctx, "quit").unwrap());
        assert!(!handle_command(&ctx, "help").unwrap());
        assert!(!handle_command(&ctx, "definitely-not-a-command").unwrap());
    }
}
