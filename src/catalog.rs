//! Built-in room, reward, and catering tables.
//!
//! The demo has no inventory service; these are the fixed offerings
//! the guest pages present.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct Room {
    pub name: &'static str,
    pub nightly_rate: u32,
    pub badge: &'static str,
    pub blurb: &'static str,
}

pub static ROOMS: &[Room] = &[
    Room {
        name: "Deluxe Room",
        nightly_rate: 15_000,
        badge: "Available",
        blurb: "King bed, garden view, breakfast included",
    },
    Room {
        name: "Executive Suite",
        nightly_rate: 25_000,
        badge: "Popular",
        blurb: "Separate lounge, work desk, airport transfer",
    },
    Room {
        name: "Presidential Suite",
        nightly_rate: 50_000,
        badge: "Exclusive",
        blurb: "Panoramic terrace, private dining, butler service",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardCategory {
    RoomUpgrade,
    Dining,
    Events,
    Experiences,
}

impl RewardCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardCategory::RoomUpgrade => "room upgrade",
            RewardCategory::Dining => "dining",
            RewardCategory::Events => "events",
            RewardCategory::Experiences => "experiences",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Reward {
    pub name: &'static str,
    pub category: RewardCategory,
    pub cost: u32,
}

pub static REWARDS: &[Reward] = &[
    Reward {
        name: "Suite Upgrade",
        category: RewardCategory::RoomUpgrade,
        cost: 800,
    },
    Reward {
        name: "Late Checkout",
        category: RewardCategory::RoomUpgrade,
        cost: 300,
    },
    Reward {
        name: "Dinner for Two",
        category: RewardCategory::Dining,
        cost: 500,
    },
    Reward {
        name: "Breakfast Voucher",
        category: RewardCategory::Dining,
        cost: 250,
    },
    Reward {
        name: "Event Hall Add-on",
        category: RewardCategory::Events,
        cost: 600,
    },
    Reward {
        name: "Spa Morning",
        category: RewardCategory::Experiences,
        cost: 900,
    },
    Reward {
        name: "Sunset City Tour",
        category: RewardCategory::Experiences,
        cost: 1_200,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct MenuPackage {
    pub name: &'static str,
    pub category: &'static str,
    pub price_per_head: u32,
}

pub static MENUS: &[MenuPackage] = &[
    MenuPackage {
        name: "Morning Pastry Board",
        category: "breakfast",
        price_per_head: 2_000,
    },
    MenuPackage {
        name: "Executive Power Lunch",
        category: "lunch",
        price_per_head: 3_500,
    },
    MenuPackage {
        name: "Continental Executive",
        category: "lunch",
        price_per_head: 3_000,
    },
    MenuPackage {
        name: "Swahili Coastal Buffet",
        category: "dinner",
        price_per_head: 4_500,
    },
    MenuPackage {
        name: "Vegan Garden Harvest",
        category: "dinner",
        price_per_head: 2_800,
    },
    MenuPackage {
        name: "Savory Cocktail Bites",
        category: "snacks",
        price_per_head: 1_500,
    },
];

static MENU_PRICES: Lazy<HashMap<&'static str, u32>> =
    Lazy::new(|| MENUS.iter().map(|m| (m.name, m.price_per_head)).collect());

/// Per-head price for a menu by name.
pub fn menu_price(name: &str) -> Option<u32> {
    MENU_PRICES.get(name).copied()
}

/// Money formatting used across the guest pages: `KES 15,000`.
pub fn format_money(currency: &str, amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{} {}", currency, grouped)
}
