pub mod test_problems;
