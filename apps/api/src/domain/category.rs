// Service category catalog
// Seeded, read-only reference data

use serde::Serialize;

use super::user::REAL_ESTATE_CATEGORY;

/// A service category with the subcategories a provider may pick from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub subcategories: &'static [&'static str],
}

/// Maximum number of categories a Plan B provider may select
pub const MAX_CATEGORIES_PLAN_B: usize = 5;

const CATALOG: &[ServiceCategory] = &[
    ServiceCategory {
        id: REAL_ESTATE_CATEGORY,
        name: "Imobiliária",
        subcategories: &["venda", "aluguel", "temporada", "administracao", "avaliacao"],
    },
    ServiceCategory {
        id: "eletricista",
        name: "Eletricista",
        subcategories: &["instalacao", "manutencao", "quadro-de-distribuicao", "iluminacao"],
    },
    ServiceCategory {
        id: "encanador",
        name: "Encanador",
        subcategories: &["vazamentos", "desentupimento", "instalacao-hidraulica", "aquecedores"],
    },
    ServiceCategory {
        id: "pintor",
        name: "Pintor",
        subcategories: &["residencial", "comercial", "textura", "grafiato"],
    },
    ServiceCategory {
        id: "diarista",
        name: "Diarista",
        subcategories: &["limpeza-geral", "pos-obra", "passadoria"],
    },
    ServiceCategory {
        id: "pedreiro",
        name: "Pedreiro",
        subcategories: &["alvenaria", "reboco", "revestimento", "reforma"],
    },
    ServiceCategory {
        id: "jardineiro",
        name: "Jardineiro",
        subcategories: &["poda", "paisagismo", "manutencao-de-jardim"],
    },
    ServiceCategory {
        id: "buffet",
        name: "Buffet e Eventos",
        subcategories: &["casamento", "aniversario", "corporativo", "decoracao"],
    },
];

/// Every seeded category
pub fn all() -> &'static [ServiceCategory] {
    CATALOG
}

/// Looks up a category by id
pub fn find(id: &str) -> Option<&'static ServiceCategory> {
    CATALOG.iter().find(|c| c.id == id)
}

/// True when `subcategory` belongs to any of the given categories
pub fn allows_subcategory<'a>(categories: impl IntoIterator<Item = &'a String>, subcategory: &str) -> bool {
    categories
        .into_iter()
        .filter_map(|id| find(id))
        .any(|c| c.subcategories.contains(&subcategory))
}
