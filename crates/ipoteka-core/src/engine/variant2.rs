//! Variant 2: raised discounts paid for by a supplementary property product.
//!
//! The base of the variant is the discounted property (raised to the
//! Variant 2 percent), discounted life and discounted title. Each
//! supplementary product that fits the object type is priced on top of that
//! base and scored by the saving it leaves against Variant 1:
//!
//! - savings below `min_saving` are never offered;
//! - "Моя квартира" and "Экспресс квартира" are preferred, the other products
//!   are considered only when neither qualifies;
//! - a saving up to `preferred_max_saving` wins over any larger one,
//!   otherwise the saving closest to `target_saving` is taken;
//! - a saving above `escalation_threshold` is brought down toward
//!   `escalation_target` by raising the product's sums.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{
    AddonCoverage, AddonLine, LifeQuote, Priced, PricingContext, PropertyQuote, TitleQuote, Variant2,
    Variant2Outcome,
};
use crate::lookup::{band_for, AddonTariffs, BastionTariff, MyFlatTariff, RiskKind, SumBand, Variant2Settings};
use crate::money::{discount_multiplier, round0, round2};
use crate::types::ObjectType;

const LIFE_ONLY: &str = "Вариант 2 не предлагается при страховании только жизни";
const PROPERTY_NOT_PRICED: &str = "Имущество не рассчитано: тариф не найден";
const NOT_CHEAPER: &str = "Вариант 2 не дешевле варианта 1";

const FINISH: &str = "отделка и инженерное оборудование";
const MOVABLE: &str = "движимое имущество";
const LIABILITY: &str = "гражданская ответственность";
const CONSTRUCT: &str = "конструктивные элементы";

/// Insured amounts above this get the small fixed sums.
const LARGE_AMOUNT: Decimal = dec!(5000000);

const MY_FLAT_FINISH_SUM: Decimal = dec!(200000);
const MY_FLAT_FINISH_SHARE: Decimal = dec!(0.08);
const MY_FLAT_FINISH_MAX: Decimal = dec!(3000000);

/// Approximate rates used to size escalated "Моя квартира" sums.
const MY_FLAT_FINISH_RATE_GUESS: Decimal = dec!(0.008);
const MY_FLAT_MOVABLE_RATE_GUESS: Decimal = dec!(0.004);
const MY_FLAT_LIABILITY_RATE_GUESS: Decimal = dec!(0.002);
const MY_FLAT_ESCALATED_FINISH_MIN: Decimal = dec!(50000);
const MY_FLAT_ESCALATED_FINISH_MAX: Decimal = dec!(500000);
const MY_FLAT_FALLBACK_RATE: Decimal = dec!(0.0095);

const BASTION_LARGE_SHARE: Decimal = dec!(0.05);
const BASTION_SHARE: Decimal = dec!(0.1);
const BASTION_FINISH_MULTIPLE: Decimal = dec!(3);

/// An escalated express pack may cost at most this multiple of the target.
const EXPRESS_OVERSHOOT: Decimal = dec!(1.5);

/// Supplementary products, in the order they are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonProduct {
    MyFlat,
    Express,
    ExpressLiability,
    Bastion,
}

impl AddonProduct {
    pub fn display_name(&self) -> &'static str {
        match self {
            AddonProduct::MyFlat => "Моя квартира",
            AddonProduct::Express => "Экспресс квартира",
            AddonProduct::ExpressLiability => "Экспресс ГО",
            AddonProduct::Bastion => "Бастион",
        }
    }

    fn is_preferred(&self) -> bool {
        matches!(self, AddonProduct::MyFlat | AddonProduct::Express)
    }

    fn candidates(house: bool) -> &'static [AddonProduct] {
        if house {
            &[AddonProduct::Bastion]
        } else {
            &[
                AddonProduct::MyFlat,
                AddonProduct::Express,
                AddonProduct::ExpressLiability,
                AddonProduct::Bastion,
            ]
        }
    }
}

#[derive(Debug, Clone)]
struct Offer {
    product: AddonProduct,
    lines: Vec<AddonLine>,
    premium: Decimal,
}

impl Offer {
    fn single(product: AddonProduct, objects: &str, coverage: AddonCoverage, premium: Decimal) -> Self {
        Self {
            product,
            lines: vec![line(product, objects, coverage, premium)],
            premium,
        }
    }

    fn from_lines(product: AddonProduct, lines: Vec<AddonLine>) -> Self {
        let premium = lines.iter().map(|l| l.premium).sum();
        Self {
            product,
            lines,
            premium,
        }
    }
}

#[derive(Debug, Clone)]
struct Scored {
    offer: Offer,
    saving: Decimal,
}

fn line(product: AddonProduct, objects: &str, coverage: AddonCoverage, premium: Decimal) -> AddonLine {
    AddonLine {
        product: product.display_name().to_string(),
        objects: objects.to_string(),
        coverage,
        premium,
    }
}

fn unavailable(reason: impl Into<String>) -> Variant2Outcome {
    let reason = reason.into();
    tracing::debug!(%reason, "Variant 2 not offered");
    Variant2Outcome::Unavailable { reason }
}

/// Premiums every Variant 2 candidate shares.
struct Base {
    property: Option<Decimal>,
    life: Option<Decimal>,
    life_borrowers: Vec<Decimal>,
    title: Option<Decimal>,
}

impl Base {
    fn total(&self) -> Decimal {
        round2(self.property.unwrap_or_default() + self.life.unwrap_or_default() + self.title.unwrap_or_default())
    }
}

pub(crate) fn build(
    ctx: &PricingContext<'_>,
    life: Option<&LifeQuote>,
    property: Option<&Priced<PropertyQuote>>,
    title: Option<&TitleQuote>,
    variant1_total: Decimal,
) -> Variant2Outcome {
    let request = ctx.request;
    if request.risks.life && !request.risks.property {
        return unavailable(LIFE_ONLY);
    }
    let house = match request.object_type {
        None | Some(ObjectType::Flat) => false,
        Some(kind) if kind.is_house() => true,
        Some(kind) => {
            return unavailable(format!(
                "Для типа объекта «{}» нет дополнительных продуктов",
                kind.display_name()
            ))
        }
    };
    let property = match property {
        None => None,
        Some(Priced::Priced(quote)) => Some(raised_property_premium(ctx, quote)),
        Some(Priced::Unavailable { .. }) => return unavailable(PROPERTY_NOT_PRICED),
    };

    let (life_total, life_borrowers) = match life {
        Some(quote) => {
            let (total, lines) = discounted_life(ctx, quote);
            (Some(total), lines)
        }
        None => (None, Vec::new()),
    };
    let base = Base {
        property,
        life: life_total,
        life_borrowers,
        title: title.map(|t| t.premium.premium_with_discount),
    };
    let fixed = base.total();
    let settings = &ctx.lookup.pricing.variant2;
    let amount = ctx.insured_amount;
    let addons = &ctx.lookup.addons;

    let scored: Vec<Scored> = AddonProduct::candidates(house)
        .iter()
        .filter_map(|product| offer_for(*product, addons, amount, house))
        .filter_map(|offer| {
            let saving = variant1_total - (fixed + offer.premium);
            tracing::debug!(product = ?offer.product, premium = %offer.premium, %saving, "Scored Variant 2 candidate");
            (saving >= settings.min_saving).then_some(Scored { offer, saving })
        })
        .collect();

    let Some(chosen) = select(&scored, settings) else {
        return unavailable(format!(
            "Нет продукта с экономией не менее {} ₽",
            round0(settings.min_saving)
        ));
    };

    let mut offer = chosen.offer.clone();
    let mut escalated = false;
    if chosen.saving > settings.escalation_threshold {
        let target_premium = variant1_total - settings.escalation_target - fixed;
        let raised = match offer.product {
            AddonProduct::MyFlat => escalate_my_flat(&addons.my_flat, target_premium),
            AddonProduct::Bastion => Some(escalate_bastion(
                bastion_tariff(addons, house),
                chosen.saving - settings.escalation_target,
                &offer,
            )),
            AddonProduct::Express => escalate_express(addons, target_premium),
            AddonProduct::ExpressLiability => None,
        };
        if let Some(raised) = raised {
            offer = raised;
            escalated = true;
        }
    }

    let total = round2(fixed + offer.premium);
    if total >= variant1_total {
        return unavailable(NOT_CHEAPER);
    }

    tracing::debug!(product = ?offer.product, %total, escalated, "Selected Variant 2 product");
    Variant2Outcome::Offered(Variant2 {
        product: offer.product,
        property: base.property,
        life: base.life,
        life_borrowers: base.life_borrowers,
        title: base.title,
        addon_premium: offer.premium,
        addons: offer.lines,
        total,
        saving: variant1_total - total,
        escalated,
    })
}

fn raised_property_premium(ctx: &PricingContext<'_>, quote: &PropertyQuote) -> Decimal {
    let undiscounted = quote.premium.premium_no_discount;
    if !ctx.terms.discounts.allows(RiskKind::Property) {
        return undiscounted;
    }
    let pct = ctx.lookup.pricing.variant2.property_discount_percent;
    round2(undiscounted * discount_multiplier(pct)).max(ctx.minimum(RiskKind::Property))
}

/// Life total and per-borrower lines; the total never drops below one floor per borrower.
fn discounted_life(ctx: &PricingContext<'_>, quote: &LifeQuote) -> (Decimal, Vec<Decimal>) {
    if !quote.premium.discount_applied {
        let lines = quote.borrowers.iter().map(|b| b.premium).collect();
        return (quote.premium.premium_no_discount, lines);
    }
    let lines: Vec<Decimal> = quote.borrowers.iter().map(|b| b.premium_with_discount).collect();
    let floor = ctx.minimum(RiskKind::Life) * Decimal::from(quote.borrowers.len() as u64);
    (quote.premium.premium_with_discount.max(floor), lines)
}

fn bastion_tariff(addons: &AddonTariffs, house: bool) -> &BastionTariff {
    if house {
        &addons.bastion.house
    } else {
        &addons.bastion.flat
    }
}

fn bastion_finish_objects(house: bool) -> String {
    format!("{} {}", FINISH, if house { "дом" } else { "квартира" })
}

fn offer_for(product: AddonProduct, addons: &AddonTariffs, amount: Decimal, house: bool) -> Option<Offer> {
    match product {
        AddonProduct::MyFlat => my_flat_offer(&addons.my_flat, amount),
        AddonProduct::Express => addons.cheapest_express().map(|pack| {
            Offer::single(
                product,
                &format!("{}, {}", FINISH, MOVABLE),
                AddonCoverage::Package {
                    finish: pack.finish,
                    movable: pack.movable,
                },
                pack.price,
            )
        }),
        AddonProduct::ExpressLiability => addons.cheapest_liability().map(|pack| {
            Offer::single(product, LIABILITY, AddonCoverage::Sum { sum: pack.sum }, pack.price)
        }),
        AddonProduct::Bastion => bastion_offer(bastion_tariff(addons, house), amount, house),
    }
}

fn my_flat_offer(tariff: &MyFlatTariff, amount: Decimal) -> Option<Offer> {
    let sum = if amount > LARGE_AMOUNT {
        MY_FLAT_FINISH_SUM
    } else {
        round0(amount * MY_FLAT_FINISH_SHARE)
            .max(MY_FLAT_FINISH_SUM)
            .min(MY_FLAT_FINISH_MAX)
    };
    let (sum, rate) = match band_for(&tariff.finish, sum) {
        Some(band) => (sum, band.rate),
        None => (MY_FLAT_FINISH_SUM, tariff.finish.first()?.rate),
    };
    Some(Offer::single(
        AddonProduct::MyFlat,
        FINISH,
        AddonCoverage::Sum { sum },
        round2(sum * rate),
    ))
}

/// Finish sum for "Бастион": a share of the insured amount within the band,
/// never above the amount itself or three band minimums.
fn bastion_finish_sum(finish: &SumBand, amount: Decimal) -> Decimal {
    let upper = finish.max.min(amount);
    if amount < finish.min {
        return finish.min.min(upper);
    }
    let share = if amount > LARGE_AMOUNT {
        BASTION_LARGE_SHARE
    } else {
        BASTION_SHARE
    };
    let reasonable = (amount * share).max(finish.min).min(finish.min * BASTION_FINISH_MULTIPLE);
    round2(reasonable.min(upper))
}

fn bastion_offer(tariff: &BastionTariff, amount: Decimal, house: bool) -> Option<Offer> {
    let sum = bastion_finish_sum(&tariff.finish, amount);
    if sum < tariff.finish.min || sum > tariff.finish.max.min(amount) {
        return None;
    }
    Some(Offer::single(
        AddonProduct::Bastion,
        &bastion_finish_objects(house),
        AddonCoverage::Sum { sum },
        round2(sum * tariff.finish.rate),
    ))
}

fn select<'a>(scored: &'a [Scored], settings: &Variant2Settings) -> Option<&'a Scored> {
    let preferred: Vec<&Scored> = scored.iter().filter(|s| s.offer.product.is_preferred()).collect();
    let (tier, preferred_tier) = if preferred.is_empty() {
        (scored.iter().collect::<Vec<_>>(), false)
    } else {
        (preferred, true)
    };

    let in_band: Vec<&Scored> = tier
        .iter()
        .copied()
        .filter(|s| s.saving <= settings.preferred_max_saving)
        .collect();
    if !in_band.is_empty() {
        // Preferred products aim for the highest total still in band; the
        // others for the lowest.
        return if preferred_tier {
            in_band.into_iter().min_by_key(|s| s.saving)
        } else {
            in_band.into_iter().min_by_key(|s| -s.saving)
        };
    }
    tier.into_iter()
        .min_by_key(|s| (s.saving - settings.target_saving).abs())
}

/// Raise "Моя квартира" sums until their premium reaches `needed`:
/// finish first, then movable property, then civil liability.
fn escalate_my_flat(tariff: &MyFlatTariff, needed: Decimal) -> Option<Offer> {
    if needed <= Decimal::ZERO {
        return None;
    }
    let product = AddonProduct::MyFlat;
    let mut lines = Vec::new();

    let finish = round0(needed / MY_FLAT_FINISH_RATE_GUESS)
        .clamp(MY_FLAT_ESCALATED_FINISH_MIN, MY_FLAT_ESCALATED_FINISH_MAX);
    let rate = band_for(&tariff.finish, finish).map_or(MY_FLAT_FALLBACK_RATE, |b| b.rate);
    let mut total = round2(finish * rate);
    lines.push(line(product, FINISH, AddonCoverage::Sum { sum: finish }, total));

    for (bands, guess, objects) in [
        (&tariff.movable, MY_FLAT_MOVABLE_RATE_GUESS, MOVABLE),
        (&tariff.liability, MY_FLAT_LIABILITY_RATE_GUESS, LIABILITY),
    ] {
        if total >= needed {
            break;
        }
        let wanted = round0((needed - total) / guess);
        let Some(band) = band_for(bands, wanted).or_else(|| bands.last()) else {
            continue;
        };
        let sum = band.clamp(wanted);
        let premium = round2(sum * band.rate);
        lines.push(line(product, objects, AddonCoverage::Sum { sum }, premium));
        total += premium;
    }

    Some(Offer::from_lines(product, lines))
}

/// Add structural elements to "Бастион" so the saving shrinks by `needed`.
fn escalate_bastion(tariff: &BastionTariff, needed: Decimal, current: &Offer) -> Offer {
    let construct = &tariff.construct;
    let minimum_premium = round2(construct.min * construct.rate);
    let additional = (needed - minimum_premium).max(Decimal::ZERO);
    let sum = if additional > Decimal::ZERO {
        construct.max.min(construct.min + round0(additional / construct.rate))
    } else {
        construct.min
    };
    let product = AddonProduct::Bastion;
    let mut lines = vec![line(
        product,
        CONSTRUCT,
        AddonCoverage::Sum { sum },
        round2(sum * construct.rate),
    )];
    lines.extend(current.lines.iter().cloned());
    Offer::from_lines(product, lines)
}

/// Swap to the express pack whose price is closest to `target`.
fn escalate_express(addons: &AddonTariffs, target: Decimal) -> Option<Offer> {
    let ceiling = target * EXPRESS_OVERSHOOT;
    let pack = addons
        .express_packs
        .iter()
        .filter(|p| p.price <= ceiling)
        .min_by_key(|p| (p.price - target).abs())
        .or_else(|| addons.most_expensive_express())?;
    Some(Offer::single(
        AddonProduct::Express,
        &format!("{}, {}", FINISH, MOVABLE),
        AddonCoverage::Package {
            finish: pack.finish,
            movable: pack.movable,
        },
        pack.price,
    ))
}
