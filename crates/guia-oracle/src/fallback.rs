//! Canned reading texts used when the provider returns a blank completion.
//!
//! The texts are intentionally generic: they acknowledge the consultation
//! and invite the user to try again, without pretending to be a real
//! reading of their question.

use guia_core::ToolKind;

/// Returns the fallback text for `tool`.
#[must_use]
pub fn content(tool: ToolKind) -> &'static str {
    match tool {
        ToolKind::Tarot => {
            "As cartas se embaralharam além do véu neste momento, e a mensagem \
             chegou difusa. Respire fundo e acolha o que o seu coração já sabe: \
             a resposta que você procura começa dentro de você. Volte em alguns \
             instantes e tire as cartas novamente com a pergunta no pensamento."
        }
        ToolKind::DailyCard => {
            "A carta de hoje se revelou em silêncio. Leve este dia com presença: \
             observe os pequenos sinais, confie na sua intuição e trate a si \
             mesma com carinho. Amanhã uma nova carta espera por você."
        }
        ToolKind::DailyHoroscope => {
            "Os astros estão em movimento e a mensagem de hoje chegou \
             incompleta. Mantenha o coração aberto: dias assim pedem calma, \
             escuta e gestos simples de cuidado. Volte mais tarde para receber \
             o seu horóscopo completo."
        }
        ToolKind::BirthChart => {
            "O desenho do seu céu de nascimento é profundo demais para caber em \
             uma leitura apressada, e neste momento o traçado chegou \
             incompleto. Guarde a sua pergunta e refaça o mapa em instantes: o \
             céu que te acolheu na primeira respiração continua no mesmo lugar."
        }
        ToolKind::Numerology => {
            "Os números guardam a sua vibração, mas a leitura de agora chegou \
             em silêncio. Cada nome carrega um caminho, e o seu continua \
             inteiro à sua espera. Refaça o cálculo em alguns instantes para \
             receber a interpretação completa."
        }
        ToolKind::DreamInterpretation => {
            "Os símbolos do seu sonho ainda estão se assentando, e a \
             interpretação chegou difusa. Anote o que você sentiu ao acordar: o \
             sentimento é a chave mais honesta de qualquer sonho. Volte em \
             instantes para revelar o restante da mensagem."
        }
    }
}
