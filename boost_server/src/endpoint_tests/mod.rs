mod admin;
mod boost;
mod catalog;
mod helpers;
mod mocks;
mod webhook;
