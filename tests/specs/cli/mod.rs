mod batch;
mod help;
mod run;
mod tasks;
