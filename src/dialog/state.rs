use serde::Serialize;

use super::prompt::preferred_name;
use super::slots::Slot;
use super::summary;
use super::MAX_SKIP_STEPS;
use crate::pipeline::extraction::Entities;
use crate::pipeline::intent::Intent;

/// What the patient said for one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub intent: Intent,
    pub entities: Entities,
}

/// Position in the interview plus everything recorded so far.
///
/// Answers are kept in completion order and each slot is recorded at most
/// once. The terminal slot absorbs further transitions.
#[derive(Debug, Clone)]
pub struct DialogState {
    current: Slot,
    answers: Vec<(Slot, Answer)>,
    retries: [u32; Slot::COUNT],
}

impl Default for DialogState {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogState {
    pub fn new() -> Self {
        Self {
            current: Slot::Greeting,
            answers: Vec::new(),
            retries: [0; Slot::COUNT],
        }
    }

    pub fn current(&self) -> Slot {
        self.current
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn answer(&self, slot: Slot) -> Option<&Answer> {
        self.answers
            .iter()
            .find(|(recorded, _)| *recorded == slot)
            .map(|(_, answer)| answer)
    }

    pub fn is_answered(&self, slot: Slot) -> bool {
        self.answer(slot).is_some()
    }

    /// Recorded answers in the order they were completed.
    pub fn answers(&self) -> impl Iterator<Item = (Slot, &Answer)> {
        self.answers.iter().map(|(slot, answer)| (*slot, answer))
    }

    pub fn retry_count(&self, slot: Slot) -> u32 {
        self.retries[slot.index()]
    }

    pub fn current_retry_count(&self) -> u32 {
        self.retry_count(self.current)
    }

    /// Prompt for the current slot with the patient's name filled in.
    pub fn current_prompt(&self, use_retry_variant: bool) -> String {
        let variants = self.current.retry_prompts();
        let template = if use_retry_variant && !variants.is_empty() {
            variants[self.current_retry_count() as usize % variants.len()]
        } else {
            self.current.prompt()
        };

        if !template.mentions_name() {
            return template.text().to_string();
        }
        template.render(&self.patient_name())
    }

    pub fn patient_name(&self) -> String {
        preferred_name(
            self.answer(Slot::Nickname).map(|a| a.text.as_str()),
            self.answer(Slot::FullName).map(|a| a.text.as_str()),
        )
    }

    pub fn is_intent_acceptable(&self, intent: &Intent) -> bool {
        let expected = self.current.expected_intents();
        expected.is_empty() || expected.contains(intent)
    }

    /// Leave the greeting slot without recording anything.
    pub fn leave_greeting(&mut self) {
        if self.current == Slot::Greeting {
            self.current = self.current.next();
        }
    }

    /// Try to complete the current slot.
    ///
    /// Accepted: the answer is recorded (unless one already exists), the
    /// slot's retry counter resets and the pointer advances. Rejected: only
    /// the retry counter moves. At the terminal slot nothing happens and the
    /// call reports success.
    pub fn transition(
        &mut self,
        intent: Intent,
        text: &str,
        entities: Entities,
        force_accept: bool,
    ) -> bool {
        let slot = self.current;
        if slot.is_terminal() {
            return true;
        }

        if !force_accept && !self.is_intent_acceptable(&intent) {
            self.retries[slot.index()] += 1;
            return false;
        }

        self.record(
            slot,
            Answer {
                text: text.to_string(),
                intent,
                entities,
            },
        );
        self.retries[slot.index()] = 0;
        self.current = slot.next();
        true
    }

    /// Record answers for later slots from facts volunteered early.
    ///
    /// Duration, location and severity only fill slots not yet passed.
    /// Symptoms only fill `gejala` once the pointer is past it but not past
    /// `riwayat_penyakit`, so the chief-complaint turn never answers it.
    /// Returns the slots that were filled.
    pub fn prefill(&mut self, entities: &Entities) -> Vec<Slot> {
        let mut filled = Vec::new();
        let position = self.current.index();

        let candidates = [
            (Slot::Duration, entities.duration.clone(), Intent::AnswerDuration),
            (
                Slot::Location,
                entities.location.as_ref().map(|loc| format!("di {loc}")),
                Intent::AnswerLocation,
            ),
            (Slot::Severity, entities.severity.clone(), Intent::AnswerSeverity),
        ];
        for (slot, text, intent) in candidates {
            let Some(text) = text else { continue };
            if slot.index() >= position && !self.is_answered(slot) {
                self.record_prefilled(slot, text, intent, entities, &mut filled);
            }
        }

        let symptoms_window =
            Slot::Symptoms.index() < position && position <= Slot::DiseaseHistory.index();
        if symptoms_window && !entities.symptoms.is_empty() && !self.is_answered(Slot::Symptoms) {
            self.record_prefilled(
                Slot::Symptoms,
                entities.symptoms.join(", "),
                Intent::AnswerSymptoms,
                entities,
                &mut filled,
            );
        }

        filled
    }

    /// Advance past slots that already hold an answer, at most
    /// `MAX_SKIP_STEPS` times and never beyond the terminal slot.
    pub fn skip_filled(&mut self) -> usize {
        let mut skipped = 0;
        while skipped < MAX_SKIP_STEPS
            && !self.current.is_terminal()
            && self.is_answered(self.current)
        {
            self.current = self.current.next();
            skipped += 1;
        }
        skipped
    }

    pub fn render_summary(&self) -> String {
        summary::render(self)
    }

    fn record_prefilled(
        &mut self,
        slot: Slot,
        text: String,
        intent: Intent,
        entities: &Entities,
        filled: &mut Vec<Slot>,
    ) {
        self.record(
            slot,
            Answer {
                text,
                intent,
                entities: entities.clone(),
            },
        );
        filled.push(slot);
    }

    fn record(&mut self, slot: Slot, answer: Answer) {
        if !self.is_answered(slot) {
            self.answers.push((slot, answer));
        }
    }

    /// Terminal state holding exactly the given answers.
    #[cfg(test)]
    pub(crate) fn with_answers(answers: &[(Slot, &str)]) -> Self {
        let mut state = Self::new();
        for (slot, text) in answers {
            state.record(
                *slot,
                Answer {
                    text: text.to_string(),
                    intent: Intent::Unclear,
                    entities: Entities::default(),
                },
            );
        }
        state.current = Slot::Summary;
        state
    }
}
