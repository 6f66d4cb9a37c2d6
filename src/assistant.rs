//! Keyword-matched FAQ assistant for the XROT 95 EVO field mower.
//!
//! A static knowledge table of keyword lists and answers. The first entry
//! with a keyword contained in the (case-folded) question wins; otherwise a
//! fixed fallback is returned. Answering never fails.

use std::path::Path;

use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::Notice;

/// Answer used when no keyword matches.
pub const FALLBACK_ANSWER: &str = "Nerozumím. Zkuste prosím použít jedno klíčové slovo, \
    např. olej, chyba, svah, nebo rtk.";

/// Greeting shown when the chat panel first opens.
pub const GREETING: &str = "Ahoj! Jsem e-ManuAI, tvůj asistent pro Barbieri XROT 95 EVO. \
    Zeptej se na cokoliv ohledně stroje.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(alias = "k")]
    pub keywords: Vec<String>,
    #[serde(alias = "a")]
    pub answer: String,
}

impl FaqEntry {
    fn new(keywords: &[&str], answer: &str) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            answer: answer.to_string(),
        }
    }
}

static BUILTIN_TABLE: Lazy<Vec<FaqEntry>> = Lazy::new(|| {
    vec![
        FaqEntry::new(
            &["olej", "motorový olej", "výměna oleje"],
            "Motor Barbieri XROT 95 EVO vyžaduje pravidelnou kontrolu a výměnu motorového oleje. \
             Použijte kvalitní syntetický olej 10W-30 nebo 5W-40. Doporučený interval výměny \
             je každých 100 motohodin.",
        ),
        FaqEntry::new(
            &["chyba", "error", "porucha", "servis"],
            "Pokud se na displeji objeví kód chyby, zastavte stroj a zkontrolujte VIBRO ALERT \
             na dálkovém ovladači. Většina chyb vyžaduje restart nebo kontrolu baterií a paliva. \
             Pro závažné chyby kontaktujte servisní středisko.",
        ),
        FaqEntry::new(
            &["svah", "sklon", "strmost"],
            "Maximální svahová dostupnost je 45° (100 % sklon). Na svazích nad 35° vždy \
             pracujte s jisticím lanem.",
        ),
        FaqEntry::new(
            &["rtk", "gps", "přesnost", "navigace"],
            "Stroj používá RTK GPS pro centimetrovou přesnost (1-2 cm). Pro RTK FIXED je nutné \
             stabilní připojení k NTRIP službě (např. CZEPOS, rtk.cuzk.cz:2101).",
        ),
        FaqEntry::new(
            &["baterie", "nabíjení", "akumulátor"],
            "XROT používá 48V bateriový systém. Pravidelně kontrolujte stav nabití, chraňte \
             baterie před extrémními teplotami a udržujte kontakty čisté.",
        ),
        FaqEntry::new(
            &["sečení", "šířka", "nože"],
            "Pracovní šířka žacího ústrojí je 95 cm, mulčovací systém se zadním výhozem. \
             Výška sečení je dálkově nastavitelná v rozsahu 30-150 mm.",
        ),
        FaqEntry::new(
            &["výkon", "motor", "koňská síla"],
            "Motor Kawasaki FS730V EFI má výkon 17,2 kW (23 HP) a krouticí moment 54,3 Nm.",
        ),
    ]
});

#[derive(Debug, Clone)]
pub struct FaqAssistant {
    entries: Vec<FaqEntry>,
}

impl Default for FaqAssistant {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FaqAssistant {
    /// Assistant over the built-in mower knowledge table.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TABLE.clone())
    }

    /// Keywords are case-folded once here so matching stays a plain substring test.
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                entry.keywords = entry
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                entry
            })
            .collect();
        Self { entries }
    }

    /// Parse a knowledge table: a JSON array of `{keywords, answer}` (or `{k, a}`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<FaqEntry> = serde_json::from_str(json).map_err(|e| PlannerError::KnowledgeTable {
            message: e.to_string(),
        })?;
        Ok(Self::new(entries))
    }

    /// Load a knowledge table file, falling back to the built-in table.
    pub fn load_or_builtin(path: &Path) -> (Self, Option<Notice>) {
        let loaded = std::fs::read_to_string(path)
            .map_err(PlannerError::from)
            .and_then(|json| Self::from_json_str(&json));

        match loaded {
            Ok(assistant) => {
                info!(
                    "[Assistant] Loaded {} entries from {}",
                    assistant.len(),
                    path.display()
                );
                (assistant, None)
            }
            Err(e) => {
                warn!("[Assistant] Failed to load {}: {}", path.display(), e);
                (
                    Self::builtin(),
                    Some(Notice::warning(
                        "Manual knowledge table could not be loaded. Using built-in answers.",
                    )),
                )
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matched answer for the question, if any entry matches.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        let question = question.trim().to_lowercase();
        if question.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.keywords.iter().any(|k| question.contains(k.as_str())))
            .map(|entry| entry.answer.as_str())
    }

    /// Answer any input: the matched entry's answer or [`FALLBACK_ANSWER`].
    pub fn answer(&self, question: &str) -> &str {
        self.lookup(question).unwrap_or(FALLBACK_ANSWER)
    }
}
