mod test_eigen;
mod test_rng;
mod test_similarity;
