pub mod ingredient_matching;
