pub mod admin;
pub mod authorize;
pub mod create_market;
pub mod flash_loan;
pub mod supply;
pub mod swap_in;
pub mod swap_math;
pub mod swap_out;
pub mod withdraw;
