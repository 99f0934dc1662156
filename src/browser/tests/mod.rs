mod form_tests;
mod navigation_tests;
