//! Prompt builders for each reading tool.
//!
//! Every builder renders a Portuguese system/user prompt pair. The system
//! prompt carries the shared guide persona plus tool-specific instructions;
//! the user prompt carries the consultation data and whatever profile
//! context the user has filled in.

use chrono::NaiveDate;
use guia_core::tarot::TarotCard;
use guia_core::{UserProfile, ZodiacSign};
use std::fmt::Write as _;

/// A rendered system/user prompt pair.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// System message: persona and tool instructions.
    pub system: String,
    /// User message: the consultation itself.
    pub user: String,
}

const PERSONA: &str = "Você é Stella, a guia mística do Guia do Coração, um espaço \
acolhedor de autoconhecimento. Fale sempre em português brasileiro, em tom caloroso, \
íntimo e esperançoso, como uma amiga sábia. Ofereça orientação prática e gentil, sem \
prometer certezas sobre o futuro e sem dar conselhos médicos, jurídicos ou \
financeiros. Nunca diga que você é uma inteligência artificial. Responda em três a \
cinco parágrafos curtos, sem listas.";

fn system_for(instructions: &str) -> String {
    format!("{PERSONA}\n\n{instructions}")
}

fn profile_lines(profile: &UserProfile) -> String {
    let mut lines = String::new();
    if let Some(name) = &profile.display_name {
        let _ = writeln!(lines, "Nome: {name}");
    }
    if let Some(birth) = profile.birth_date {
        let sign = ZodiacSign::from_date(birth);
        let _ = writeln!(
            lines,
            "Nascimento: {} (signo solar: {})",
            birth.format("%d/%m/%Y"),
            sign.name_pt()
        );
    }
    if let Some(status) = &profile.relationship_status {
        let _ = writeln!(lines, "Situação amorosa: {status}");
    }
    if let Some(focus) = profile.focus {
        let _ = writeln!(lines, "Foco atual: {}", focus.label_pt());
    }
    if let Some(context) = &profile.context {
        let _ = writeln!(lines, "Momento de vida: {context}");
    }
    if lines.is_empty() {
        lines.push_str("A consulente preferiu não compartilhar dados pessoais.\n");
    }
    lines
}

fn card_lines(cards: &[&TarotCard]) -> String {
    let mut lines = String::new();
    for (position, card) in cards.iter().enumerate() {
        let _ = writeln!(
            lines,
            "Carta {}: {} ({})",
            position + 1,
            card.name,
            card.keywords
        );
    }
    lines
}

/// Prompt for a three-card love tarot spread.
#[must_use]
pub fn tarot(question: &str, cards: &[&TarotCard], profile: &UserProfile) -> Prompt {
    let system = system_for(
        "Você fará uma tiragem de Tarot do Amor com três cartas: passado, presente e \
         futuro da questão. Interprete cada carta na posição em que saiu e encerre \
         com um conselho único que amarre a leitura.",
    );
    let mut user = String::new();
    let _ = writeln!(user, "Pergunta da consulente: {question}");
    user.push('\n');
    user.push_str(&card_lines(cards));
    user.push('\n');
    user.push_str(&profile_lines(profile));
    Prompt { system, user }
}

/// Prompt for the single daily card.
#[must_use]
pub fn daily_card(card: &TarotCard, date: NaiveDate, profile: &UserProfile) -> Prompt {
    let system = system_for(
        "Você revelará a Carta do Dia: uma única carta de tarot como mensagem para as \
         próximas vinte e quatro horas. Interprete a carta no contexto do dia a dia e \
         sugira uma pequena atitude concreta inspirada por ela.",
    );
    let mut user = String::new();
    let _ = writeln!(user, "Data: {}", date.format("%d/%m/%Y"));
    let _ = writeln!(user, "Carta sorteada: {} ({})", card.name, card.keywords);
    user.push('\n');
    user.push_str(&profile_lines(profile));
    Prompt { system, user }
}

/// Prompt for the daily horoscope of `sign`.
#[must_use]
pub fn daily_horoscope(sign: ZodiacSign, date: NaiveDate, profile: &UserProfile) -> Prompt {
    let system = system_for(
        "Você escreverá o Horóscopo do Dia para o signo solar da consulente. Fale de \
         amor, trabalho e energia do dia, sempre em tom de orientação e nunca de \
         previsão fechada.",
    );
    let mut user = String::new();
    let _ = writeln!(user, "Signo: {}", sign.name_pt());
    let _ = writeln!(user, "Data: {}", date.format("%d/%m/%Y"));
    user.push('\n');
    user.push_str(&profile_lines(profile));
    Prompt { system, user }
}

/// Prompt for a birth chart reading.
///
/// `birth_time` and `birth_place` may be absent; the instructions tell the
/// guide to read only what the available data supports.
#[must_use]
pub fn birth_chart(
    birth_date: NaiveDate,
    birth_time: Option<&str>,
    birth_place: Option<&str>,
    profile: &UserProfile,
) -> Prompt {
    let system = system_for(
        "Você fará uma leitura de Mapa Astral a partir dos dados de nascimento. \
         Comece pelo signo solar e pelo que ele revela da essência da consulente. Se \
         horário e cidade de nascimento estiverem presentes, fale também de \
         ascendente e das casas em termos acessíveis; se faltarem, interprete apenas \
         o que os dados permitem, sem inventar posições.",
    );
    let sun = ZodiacSign::from_date(birth_date);
    let mut user = String::new();
    let _ = writeln!(
        user,
        "Data de nascimento: {}",
        birth_date.format("%d/%m/%Y")
    );
    let _ = writeln!(user, "Signo solar: {}", sun.name_pt());
    if let Some(time) = birth_time {
        let _ = writeln!(user, "Horário de nascimento: {time}");
    }
    if let Some(place) = birth_place {
        let _ = writeln!(user, "Local de nascimento: {place}");
    }
    user.push('\n');
    user.push_str(&profile_lines(profile));
    Prompt { system, user }
}

/// Prompt for a numerology reading.
#[must_use]
pub fn numerology(
    full_name: &str,
    destiny: u8,
    life_path: Option<u8>,
    profile: &UserProfile,
) -> Prompt {
    let system = system_for(
        "Você fará uma leitura de Numerologia. Os números já foram calculados pelo \
         método pitagórico; interprete o que cada um revela sobre talentos, desafios \
         e caminho de vida da consulente, relacionando-os entre si quando houver mais \
         de um.",
    );
    let mut user = String::new();
    let _ = writeln!(user, "Nome completo: {full_name}");
    let _ = writeln!(
        user,
        "Número de destino: {destiny} ({})",
        guia_core::numerology::meaning_pt(destiny)
    );
    if let Some(path) = life_path {
        let _ = writeln!(
            user,
            "Número do caminho de vida: {path} ({})",
            guia_core::numerology::meaning_pt(path)
        );
    }
    user.push('\n');
    user.push_str(&profile_lines(profile));
    Prompt { system, user }
}

/// Prompt for a dream interpretation.
#[must_use]
pub fn dream(description: &str, profile: &UserProfile) -> Prompt {
    let system = system_for(
        "Você fará uma Interpretação de Sonhos. Identifique os símbolos centrais do \
         relato, ofereça leituras possíveis para cada um e conecte o sonho ao momento \
         de vida da consulente, deixando claro que ela é quem reconhece o sentido \
         verdadeiro.",
    );
    let mut user = String::new();
    let _ = writeln!(user, "Relato do sonho: {description}");
    user.push('\n');
    user.push_str(&profile_lines(profile));
    Prompt { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guia_core::tarot::MAJOR_ARCANA;
    use guia_core::FocusArea;

    fn full_profile() -> UserProfile {
        UserProfile {
            display_name: Some("Maria".to_owned()),
            birth_date: NaiveDate::from_ymd_opt(1990, 3, 25),
            birth_time: Some("14:30".to_owned()),
            birth_place: Some("Salvador, BA".to_owned()),
            relationship_status: Some("solteira".to_owned()),
            focus: Some(FocusArea::Love),
            context: None,
        }
    }

    #[test]
    fn tarot_prompt_lists_cards_and_question() {
        let cards: Vec<&TarotCard> = MAJOR_ARCANA.iter().take(3).collect();
        let prompt = tarot("Ele vai voltar?", &cards, &full_profile());

        assert!(prompt.system.contains("Stella"));
        assert!(prompt.system.contains("três cartas"));
        assert!(prompt.user.contains("Ele vai voltar?"));
        assert!(prompt.user.contains("Carta 1: O Louco"));
        assert!(prompt.user.contains("Carta 3:"));
        assert!(prompt.user.contains("Nome: Maria"));
    }

    #[test]
    fn horoscope_prompt_names_the_sign() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        let prompt = daily_horoscope(ZodiacSign::Aries, date, &full_profile());
        assert!(prompt.user.contains("Signo: Áries"));
        assert!(prompt.user.contains("01/06/2024"));
    }

    #[test]
    fn birth_chart_prompt_skips_missing_fields() {
        let birth = NaiveDate::from_ymd_opt(1990, 3, 25).expect("valid date");
        let prompt = birth_chart(birth, None, None, &UserProfile::default());
        assert!(prompt.user.contains("Signo solar: Áries"));
        assert!(!prompt.user.contains("Horário de nascimento"));
        assert!(!prompt.user.contains("Local de nascimento"));
        assert!(prompt.user.contains("preferiu não compartilhar"));
    }

    #[test]
    fn numerology_prompt_includes_meanings() {
        let prompt = numerology("Maria Silva", 6, Some(11), &UserProfile::default());
        assert!(prompt.user.contains("Número de destino: 6"));
        assert!(prompt.user.contains("Número do caminho de vida: 11"));
        assert!(prompt.user.contains("intuição elevada"));
    }

    #[test]
    fn every_prompt_carries_the_persona() {
        let profile = UserProfile::default();
        let birth = NaiveDate::from_ymd_opt(1985, 1, 1).expect("valid date");
        let cards: Vec<&TarotCard> = MAJOR_ARCANA.iter().take(3).collect();
        let prompts = [
            tarot("pergunta", &cards, &profile),
            daily_card(&MAJOR_ARCANA[0], birth, &profile),
            daily_horoscope(ZodiacSign::Leo, birth, &profile),
            birth_chart(birth, None, None, &profile),
            numerology("Ana", 7, None, &profile),
            dream("sonhei com o mar", &profile),
        ];
        for prompt in prompts {
            assert!(prompt.system.contains("português brasileiro"));
            assert!(!prompt.user.trim().is_empty());
        }
    }
}
