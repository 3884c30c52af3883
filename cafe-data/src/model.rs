use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};

/// One line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Ingredient {
    #[garde(length(min = 1), custom(not_blank))]
    pub name: String,
    #[garde(length(min = 1), custom(not_blank))]
    pub color: String,
    #[garde(range(min = 1))]
    pub parts: u32,
}

/// Public view of an ingredient: color and proportion, no name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

/// A non-empty list of ingredients.
///
/// Accepts either a single ingredient object or an array of them on input;
/// always serializes as an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(transparent)]
pub struct Recipe(#[garde(length(min = 1), dive)] pub Vec<Ingredient>);

impl<'de> Deserialize<'de> for Recipe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(Ingredient),
            Many(Vec<Ingredient>),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(ingredient) => Recipe(vec![ingredient]),
            OneOrMany::Many(ingredients) => Recipe(ingredients),
        })
    }
}

impl From<Vec<Ingredient>> for Recipe {
    fn from(ingredients: Vec<Ingredient>) -> Self {
        Recipe(ingredients)
    }
}

/// A stored drink. Serializes as the long representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// The public representation of a drink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|i| ShortIngredient {
                    color: i.color.clone(),
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

/// Body of a create request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewDrink {
    #[garde(length(min = 1, max = 80), custom(not_blank))]
    pub title: String,
    #[garde(dive)]
    pub recipe: Recipe,
}

/// Body of an update request. The recipe is kept when omitted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DrinkPatch {
    #[garde(length(min = 1, max = 80), custom(not_blank))]
    pub title: String,
    #[serde(default)]
    #[garde(dive)]
    pub recipe: Option<Recipe>,
}

impl DrinkPatch {
    /// Apply this update to an existing drink.
    pub fn apply_to(self, drink: &mut Drink) {
        drink.title = self.title;
        if let Some(Recipe(recipe)) = self.recipe {
            drink.recipe = recipe;
        }
    }
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}
