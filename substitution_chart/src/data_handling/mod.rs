pub mod substitution_scores;
