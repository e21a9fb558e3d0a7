//! Tariffs of the supplementary property products offered in Variant 2.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allowed sum range for a sub-coverage and its rate (fraction of the sum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumBand {
    pub min: Decimal,
    pub max: Decimal,
    pub rate: Decimal,
}

impl SumBand {
    pub fn contains(&self, sum: Decimal) -> bool {
        sum >= self.min && sum <= self.max
    }

    pub fn clamp(&self, sum: Decimal) -> Decimal {
        sum.clamp(self.min, self.max)
    }
}

/// First band that contains `sum`.
pub fn band_for(bands: &[SumBand], sum: Decimal) -> Option<&SumBand> {
    bands.iter().find(|b| b.contains(sum))
}

/// "Бастион": structural elements and finish, priced per sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BastionTariff {
    pub construct: SumBand,
    pub finish: SumBand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BastionTariffs {
    pub flat: BastionTariff,
    pub house: BastionTariff,
}

/// Fixed "Экспресс квартира" package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressPack {
    pub id: u32,
    pub finish: Decimal,
    pub movable: Decimal,
    /// Price without civil liability
    pub price: Decimal,
    pub price_with_liability: Decimal,
}

/// Fixed "Экспресс ГО" civil liability package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiabilityPack {
    pub sum: Decimal,
    pub price: Decimal,
}

/// "Моя квартира": banded rates per sub-coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyFlatTariff {
    pub finish: Vec<SumBand>,
    pub movable: Vec<SumBand>,
    pub liability: Vec<SumBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddonTariffs {
    pub bastion: BastionTariffs,
    pub express_packs: Vec<ExpressPack>,
    pub express_liability_packs: Vec<LiabilityPack>,
    pub my_flat: MyFlatTariff,
}

impl AddonTariffs {
    pub fn cheapest_express(&self) -> Option<&ExpressPack> {
        self.express_packs.iter().min_by_key(|p| p.price)
    }

    pub fn most_expensive_express(&self) -> Option<&ExpressPack> {
        self.express_packs.iter().max_by_key(|p| p.price)
    }

    pub fn cheapest_liability(&self) -> Option<&LiabilityPack> {
        self.express_liability_packs.iter().min_by_key(|p| p.price)
    }
}
