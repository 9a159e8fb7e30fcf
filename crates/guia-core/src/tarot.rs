//! The major arcana deck and server-side card draws.
//!
//! Cards are drawn on the server so the stored reading, the prompt, and the
//! response all agree on the spread.

use rand::seq::SliceRandom;
use serde::Serialize;

/// One major arcana card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TarotCard {
    /// Position in the major arcana (0-21).
    pub number: u8,

    /// Portuguese card name.
    pub name: &'static str,

    /// Upright keywords fed to the prompt.
    pub keywords: &'static str,
}

/// The 22 major arcana, in order.
pub const MAJOR_ARCANA: [TarotCard; 22] = [
    TarotCard { number: 0, name: "O Louco", keywords: "novos começos, espontaneidade" },
    TarotCard { number: 1, name: "O Mago", keywords: "manifestação, poder pessoal" },
    TarotCard { number: 2, name: "A Sacerdotisa", keywords: "intuição, mistério" },
    TarotCard { number: 3, name: "A Imperatriz", keywords: "abundância, acolhimento" },
    TarotCard { number: 4, name: "O Imperador", keywords: "estrutura, autoridade" },
    TarotCard { number: 5, name: "O Hierofante", keywords: "tradição, sabedoria espiritual" },
    TarotCard { number: 6, name: "Os Enamorados", keywords: "amor, escolhas" },
    TarotCard { number: 7, name: "O Carro", keywords: "determinação, vitória" },
    TarotCard { number: 8, name: "A Força", keywords: "coragem, domínio interior" },
    TarotCard { number: 9, name: "O Eremita", keywords: "introspecção, busca interior" },
    TarotCard { number: 10, name: "A Roda da Fortuna", keywords: "ciclos, destino" },
    TarotCard { number: 11, name: "A Justiça", keywords: "equilíbrio, verdade" },
    TarotCard { number: 12, name: "O Enforcado", keywords: "entrega, nova perspectiva" },
    TarotCard { number: 13, name: "A Morte", keywords: "transformação, recomeço" },
    TarotCard { number: 14, name: "A Temperança", keywords: "harmonia, paciência" },
    TarotCard { number: 15, name: "O Diabo", keywords: "apegos, desejos" },
    TarotCard { number: 16, name: "A Torre", keywords: "ruptura, revelação" },
    TarotCard { number: 17, name: "A Estrela", keywords: "esperança, renovação" },
    TarotCard { number: 18, name: "A Lua", keywords: "ilusões, inconsciente" },
    TarotCard { number: 19, name: "O Sol", keywords: "alegria, sucesso" },
    TarotCard { number: 20, name: "O Julgamento", keywords: "despertar, renascimento" },
    TarotCard { number: 21, name: "O Mundo", keywords: "realização, plenitude" },
];

/// Draw `n` distinct cards from the major arcana.
///
/// Draws at most 22 cards; asking for more returns the whole deck in
/// shuffled order.
#[must_use]
pub fn draw(n: usize) -> Vec<&'static TarotCard> {
    let mut rng = rand::thread_rng();
    MAJOR_ARCANA.choose_multiple(&mut rng, n).collect()
}

/// Draw a single card, as the daily draw does.
#[must_use]
pub fn draw_one() -> &'static TarotCard {
    let mut rng = rand::thread_rng();
    // The deck is a non-empty const array, so `choose` always succeeds.
    MAJOR_ARCANA.choose(&mut rng).unwrap_or(&MAJOR_ARCANA[0])
}

/// Look up a card by its Portuguese name (case-insensitive, trimmed).
#[must_use]
pub fn find(name: &str) -> Option<&'static TarotCard> {
    let wanted = name.trim().to_lowercase();
    MAJOR_ARCANA
        .iter()
        .find(|card| card.name.to_lowercase() == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deck_has_22_distinct_cards() {
        let names: HashSet<&str> = MAJOR_ARCANA.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), 22);
        for (i, card) in MAJOR_ARCANA.iter().enumerate() {
            assert_eq!(usize::from(card.number), i);
        }
    }

    #[test]
    fn draw_has_no_repeats() {
        for _ in 0..50 {
            let cards = draw(3);
            assert_eq!(cards.len(), 3);
            let names: HashSet<&str> = cards.iter().map(|c| c.name).collect();
            assert_eq!(names.len(), 3);
        }
    }

    #[test]
    fn draw_caps_at_deck_size() {
        assert_eq!(draw(100).len(), 22);
    }

    #[test]
    fn draw_one_returns_a_deck_card() {
        for _ in 0..20 {
            let card = draw_one();
            assert!(MAJOR_ARCANA.iter().any(|c| c.number == card.number));
        }
    }

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(find("a estrela").map(|c| c.number), Some(17));
        assert_eq!(find("  O SOL  ").map(|c| c.number), Some(19));
        assert!(find("O Coringa").is_none());
    }
}
