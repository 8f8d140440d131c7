//! Governorates and the shipping rate table.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use salesbook_core::{DomainError, Money};

macro_rules! governorates {
    ($($variant:ident => $english:literal, $arabic:literal;)+) => {
        /// A region from the fixed, closed set of Egyptian governorates.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Governorate {
            $($variant,)+
        }

        impl Governorate {
            pub const ALL: &'static [Governorate] = &[$(Governorate::$variant,)+];

            /// Canonical (English) name; used on the wire.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Governorate::$variant => $english,)+
                }
            }

            pub fn arabic_name(&self) -> &'static str {
                match self {
                    $(Governorate::$variant => $arabic,)+
                }
            }
        }
    };
}

governorates! {
    Cairo => "Cairo", "القاهرة";
    Giza => "Giza", "الجيزة";
    Alexandria => "Alexandria", "الإسكندرية";
    Qalyubia => "Qalyubia", "القليوبية";
    Sharqia => "Sharqia", "الشرقية";
    Dakahlia => "Dakahlia", "الدقهلية";
    Gharbia => "Gharbia", "الغربية";
    Monufia => "Monufia", "المنوفية";
    Beheira => "Beheira", "البحيرة";
    KafrElSheikh => "Kafr El Sheikh", "كفر الشيخ";
    Damietta => "Damietta", "دمياط";
    PortSaid => "Port Said", "بورسعيد";
    Ismailia => "Ismailia", "الإسماعيلية";
    Suez => "Suez", "السويس";
    NorthSinai => "North Sinai", "شمال سيناء";
    SouthSinai => "South Sinai", "جنوب سيناء";
    RedSea => "Red Sea", "البحر الأحمر";
    Matrouh => "Matrouh", "مطروح";
    NewValley => "New Valley", "الوادي الجديد";
    Faiyum => "Faiyum", "الفيوم";
    BeniSuef => "Beni Suef", "بني سويف";
    Minya => "Minya", "المنيا";
    Asyut => "Asyut", "أسيوط";
    Sohag => "Sohag", "سوهاج";
    Qena => "Qena", "قنا";
    Luxor => "Luxor", "الأقصر";
    Aswan => "Aswan", "أسوان";
}

impl core::fmt::Display for Governorate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Governorate {
    type Err = DomainError;

    /// Accepts the English name (case and separator insensitive) or the
    /// Arabic name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s);
        let trimmed = s.trim();
        Governorate::ALL
            .iter()
            .copied()
            .find(|g| fold(g.name()) == wanted || g.arabic_name() == trimmed)
            .ok_or_else(|| DomainError::invalid_id(format!("unknown governorate {s:?}")))
    }
}

fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Serialize for Governorate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Governorate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Region-keyed shipping costs.
///
/// Changed only through explicit settings actions; read whenever an
/// invoice's governorate changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShippingRates(BTreeMap<Governorate, Money>);

impl ShippingRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rate(&self, governorate: Governorate) -> Option<Money> {
        self.0.get(&governorate).copied()
    }

    pub fn set_rate(&mut self, governorate: Governorate, cost: Money) {
        self.0.insert(governorate, cost);
    }

    pub fn remove_rate(&mut self, governorate: Governorate) -> Option<Money> {
        self.0.remove(&governorate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Governorate, Money)> + '_ {
        self.0.iter().map(|(g, m)| (*g, *m))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Governorate, Money)> for ShippingRates {
    fn from_iter<I: IntoIterator<Item = (Governorate, Money)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// New shipping cost after the governorate is set to `governorate`.
///
/// The table value wins when the region has an entry; otherwise the current
/// value is kept. This is a one-way push, not a binding.
pub fn resolve_shipping(governorate: Governorate, rates: &ShippingRates, current: Money) -> Money {
    rates.rate(governorate).unwrap_or(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn there_are_27_governorates() {
        assert_eq!(Governorate::ALL.len(), 27);
    }

    #[test]
    fn parses_english_and_arabic_names() {
        assert_eq!("kafr el sheikh".parse::<Governorate>().unwrap(), Governorate::KafrElSheikh);
        assert_eq!("port-said".parse::<Governorate>().unwrap(), Governorate::PortSaid);
        assert_eq!("الجيزة".parse::<Governorate>().unwrap(), Governorate::Giza);
        assert!("Atlantis".parse::<Governorate>().is_err());
    }

    #[test]
    fn table_entry_overwrites_current_value() {
        let mut rates = ShippingRates::new();
        rates.set_rate(Governorate::Cairo, Money::from_units(30));
        assert_eq!(
            resolve_shipping(Governorate::Cairo, &rates, Money::from_units(99)),
            Money::from_units(30)
        );
    }

    #[test]
    fn missing_entry_keeps_current_value() {
        let rates = ShippingRates::new();
        assert_eq!(
            resolve_shipping(Governorate::Aswan, &rates, Money::from_units(99)),
            Money::from_units(99)
        );
    }

    #[test]
    fn rates_serialize_as_object_keyed_by_name() {
        let rates: ShippingRates = [
            (Governorate::Giza, Money::from_units(40)),
            (Governorate::RedSea, Money::from_minor(7550)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&rates).unwrap();
        assert_eq!(json, r#"{"Giza":40,"Red Sea":75.5}"#);
        let back: ShippingRates = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rates);
    }
}
