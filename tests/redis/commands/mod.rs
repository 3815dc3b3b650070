mod blpop;
mod lists;
mod replication;
mod sorted_sets;
mod strings;
mod subscribe;
mod transaction;
mod xrange;
mod xread;
