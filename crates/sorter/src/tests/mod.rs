mod driver_tests;
mod helpers;
