//! Mapping between the API enums in `common` and the stored enums in `model`.

use common::{EntryKind, Recurrence};
use model::entities::ledger_entry::{EntryKind as StoredKind, RecurrencePeriod};

pub fn kind_to_model(kind: EntryKind) -> StoredKind {
    match kind {
        EntryKind::Income => StoredKind::Income,
        EntryKind::Expense => StoredKind::Expense,
    }
}

pub fn kind_from_model(kind: StoredKind) -> EntryKind {
    match kind {
        StoredKind::Income => EntryKind::Income,
        StoredKind::Expense => EntryKind::Expense,
    }
}

pub fn recurrence_to_model(recurrence: Recurrence) -> RecurrencePeriod {
    match recurrence {
        Recurrence::OneOff => RecurrencePeriod::OneOff,
        Recurrence::Daily => RecurrencePeriod::Daily,
        Recurrence::Weekly => RecurrencePeriod::Weekly,
        Recurrence::Monthly => RecurrencePeriod::Monthly,
        Recurrence::Yearly => RecurrencePeriod::Yearly,
    }
}

pub fn recurrence_from_model(period: RecurrencePeriod) -> Recurrence {
    match period {
        RecurrencePeriod::OneOff => Recurrence::OneOff,
        RecurrencePeriod::Daily => Recurrence::Daily,
        RecurrencePeriod::Weekly => Recurrence::Weekly,
        RecurrencePeriod::Monthly => Recurrence::Monthly,
        RecurrencePeriod::Yearly => Recurrence::Yearly,
    }
}
