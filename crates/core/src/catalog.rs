use crate::keyboard::{Button, Keyboard};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub variant: Option<&'static str>,
    pub emoji: &'static str,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "Arepa",
        variant: Some("Maíz Multigranos"),
        emoji: "🫓",
    },
    CatalogEntry {
        name: "Arepa",
        variant: Some("Maíz Queso y Semillas"),
        emoji: "🫓",
    },
    CatalogEntry {
        name: "Arepa",
        variant: Some("Yuca y Queso"),
        emoji: "🫓",
    },
    CatalogEntry {
        name: "Arepa",
        variant: Some("Maduro y Queso"),
        emoji: "🫓",
    },
    CatalogEntry {
        name: "Brownie",
        variant: None,
        emoji: "🍫",
    },
    CatalogEntry {
        name: "Muffin",
        variant: Some("Chocolate"),
        emoji: "🧁",
    },
    CatalogEntry {
        name: "Muffin",
        variant: Some("Banano"),
        emoji: "🧁",
    },
    CatalogEntry {
        name: "Muffin",
        variant: Some("Zanahoria"),
        emoji: "🧁",
    },
    CatalogEntry {
        name: "Waffle",
        variant: Some("Yuca y Queso"),
        emoji: "🧇",
    },
    CatalogEntry {
        name: "Waffle",
        variant: Some("Plátano y Queso"),
        emoji: "🧇",
    },
];

impl CatalogEntry {
    pub fn display_name(&self) -> String {
        display_name(self.name, self.variant)
    }

    /// Stable identifier embedded in button callback data, e.g. `muffin_banano`
    /// or `brownie_` for a variant-less product.
    pub fn button_id(&self) -> String {
        let variant = self.variant.unwrap_or_default();
        format!(
            "{}_{}",
            self.name.to_lowercase(),
            variant.to_lowercase().replace(' ', "_")
        )
    }
}

pub fn display_name(name: &str, variant: Option<&str>) -> String {
    match variant {
        Some(variant) => format!("{name} {variant}"),
        None => name.to_string(),
    }
}

pub fn find_by_button_id(button_id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.button_id() == button_id)
}

pub fn product_menu() -> Keyboard {
    let buttons: Vec<Button> = CATALOG
        .iter()
        .map(|entry| {
            Button::new(
                format!("{} {}", entry.emoji, entry.display_name()),
                format!("prod_{}", entry.button_id()),
            )
        })
        .collect();

    let mut keyboard = Keyboard::new();
    for pair in buttons.chunks(2) {
        keyboard = keyboard.row(pair.to_vec());
    }
    keyboard.row(vec![Button::new("✅ Finalizar pedido", "prod_finalizar")])
}

pub fn quantity_menu() -> Keyboard {
    let digits = |range: std::ops::RangeInclusive<u32>| {
        range
            .map(|n| Button::new(n.to_string(), format!("cant_{n}")))
            .collect::<Vec<_>>()
    };

    Keyboard::new()
        .row(digits(1..=5))
        .row(digits(6..=10))
        .row(vec![Button::new("❌ Cancelar", "cant_cancelar")])
}

pub fn confirm_menu() -> Keyboard {
    Keyboard::new().row(vec![
        Button::new("✅ Confirmar", "confirm_si"),
        Button::new("❌ Cancelar", "confirm_no"),
    ])
}
