//! Factories, consumers, producers, and injected services.

use mapweave::{
    Arguments, ConsumerDeclaration, Declared, FactoryDeclaration, FieldDeclaration, MapError,
    ParamDeclaration, ProducerDeclaration, SemanticType, TypeDescriptor, impl_mappable,
};
use serde_json::json;

#[derive(Clone, Debug, PartialEq)]
pub struct Money {
    pub cents: i64,
    pub currency: String,
}

impl_mappable!(Money { cents, currency });

impl Money {
    fn from_amount(args: &mut Arguments) -> Result<Self, MapError> {
        Ok(Self {
            cents: args.int("amount")? * 100,
            currency: args.string("currency")?,
        })
    }

    fn from_cents(args: &mut Arguments) -> Result<Self, MapError> {
        Ok(Self {
            cents: args.int("cents")?,
            currency: args.string("currency")?,
        })
    }
}

impl Declared for Money {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .field(FieldDeclaration::new("amount", SemanticType::Int).parameter())
            .field(FieldDeclaration::new("cents", SemanticType::Int).parameter())
            .factory(
                FactoryDeclaration::new("fromAmount", Self::from_amount)
                    .priority(100)
                    .param(ParamDeclaration::new("amount"))
                    .param(ParamDeclaration::mapped(FieldDeclaration::new(
                        "currency",
                        SemanticType::String,
                    ))),
            )
            .factory(
                FactoryDeclaration::new("fromCents", Self::from_cents)
                    .param(ParamDeclaration::new("cents"))
                    .param(
                        ParamDeclaration::mapped(FieldDeclaration::new(
                            "currency",
                            SemanticType::String,
                        ))
                        .default("EUR"),
                    ),
            )
    }
}

/// Service injected into [`Invoice`]'s consumer.
#[derive(Debug)]
pub struct CurrencyFormatter {
    pub symbol: String,
}

impl CurrencyFormatter {
    #[must_use]
    pub fn render(&self, label: &str, total: i64) -> String {
        format!("{label}: {}{total}", self.symbol)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Invoice {
    pub number: Option<String>,
    pub total: Option<i64>,
    pub label: Option<String>,
    pub formatted: Option<String>,
}

impl_mappable!(Invoice {
    number,
    total,
    label,
    formatted
});

impl Invoice {
    fn format(&mut self, args: &mut Arguments) -> Result<(), MapError> {
        let formatter = args.service::<CurrencyFormatter>("formatter")?;
        let label = args.string("label")?;
        self.formatted = Some(formatter.render(&label, self.total.unwrap_or_default()));
        self.label = Some(label);
        Ok(())
    }
}

impl Declared for Invoice {
    fn declarations() -> TypeDescriptor {
        TypeDescriptor::new()
            .default_constructor::<Self>()
            .field(FieldDeclaration::new("number", SemanticType::String))
            .field(FieldDeclaration::new("total", SemanticType::Int))
            .consumer(
                ConsumerDeclaration::new("format", Self::format)
                    .param(ParamDeclaration::injected("formatter", "CurrencyFormatter"))
                    .param(ParamDeclaration::mapped(
                        FieldDeclaration::new("label", SemanticType::String).path("meta.label"),
                    )),
            )
            .producer(
                ProducerDeclaration::new("summary", |invoice: &Self| {
                    invoice.formatted.clone().unwrap_or_default()
                })
                .path("meta.summary"),
            )
            .producer(ProducerDeclaration::new("links", |invoice: &Self| {
                json!({
                    "links": {
                        "self": format!("/invoices/{}", invoice.number.as_deref().unwrap_or("new")),
                    }
                })
            }))
    }
}
