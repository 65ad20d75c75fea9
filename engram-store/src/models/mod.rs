pub mod eval_result;
